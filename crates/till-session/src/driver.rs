//! # Session Driver
//!
//! Runs one [`DrawerSession`] on its own tokio task so the presentation
//! layer only deals with channels.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SessionHandle ──── SessionEvent (mpsc) ────► driver task              │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                            DrawerSession               │
//! │                                                  │                      │
//! │  Receiver<Outbound> ◄──── Outbound (mpsc) ───────┘                      │
//! │                                                                         │
//! │  The task ends when the session finishes, on Exit, or when every       │
//! │  handle has been dropped.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::session::DrawerSession;
use crate::snapshot::{Directive, SessionInput, SessionSnapshot};

/// Channel capacity in both directions.
const CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// Messages
// =============================================================================

/// Everything a driver task accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Snapshot(SessionSnapshot),
    Input(SessionInput),
}

/// A directive stamped with its session and emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub session_id: Uuid,
    pub emitted_at: DateTime<Utc>,
    pub directive: Directive,
}

// =============================================================================
// Driver
// =============================================================================

pub struct SessionDriver {
    id: Uuid,
    session: DrawerSession,
    events_rx: mpsc::Receiver<SessionEvent>,
    outbound_tx: mpsc::Sender<Outbound>,
}

impl SessionDriver {
    /// Spawns the driver task for `session`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(session: DrawerSession) -> (SessionHandle, mpsc::Receiver<Outbound>) {
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let id = Uuid::new_v4();

        let driver = SessionDriver {
            id,
            session,
            events_rx,
            outbound_tx,
        };

        tokio::spawn(driver.run());

        (SessionHandle { id, events_tx }, outbound_rx)
    }

    /// Main driver loop.
    async fn run(mut self) {
        let workflow = self.session.workflow();
        info!(session_id = %self.id, event_type = %workflow.event_type, "Drawer session started");

        while let Some(event) = self.events_rx.recv().await {
            let exiting = matches!(event, SessionEvent::Input(SessionInput::Exit));

            let result = match event {
                SessionEvent::Snapshot(snapshot) => self.session.on_snapshot(snapshot),
                SessionEvent::Input(input) => self.session.on_input(input),
            };

            match result {
                Ok(directives) => {
                    if !self.emit(directives).await {
                        warn!(session_id = %self.id, "Outbound receiver dropped");
                        break;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(session_id = %self.id, error = %e, "Rejected session event");
                }
                Err(e) => {
                    error!(session_id = %self.id, error = %e, "Drawer session failed");
                    break;
                }
            }

            if exiting || self.session.is_finished() {
                break;
            }
        }

        info!(
            session_id = %self.id,
            finished = self.session.is_finished(),
            "Drawer session stopped"
        );
    }

    /// Sends directives in order; false once nobody is listening.
    async fn emit(&self, directives: Vec<Directive>) -> bool {
        for directive in directives {
            debug!(session_id = %self.id, ?directive, "Emitting directive");
            let outbound = Outbound {
                session_id: self.id,
                emitted_at: Utc::now(),
                directive,
            };
            if self.outbound_tx.send(outbound).await.is_err() {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable sender side of a running driver.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    events_tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn send(&self, event: SessionEvent) -> SessionResult<()> {
        self.events_tx
            .send(event)
            .await
            .map_err(|_| SessionError::SessionClosed)
    }

    pub async fn snapshot(&self, snapshot: SessionSnapshot) -> SessionResult<()> {
        self.send(SessionEvent::Snapshot(snapshot)).await
    }

    pub async fn input(&self, input: SessionInput) -> SessionResult<()> {
        self.send(SessionEvent::Input(input)).await
    }
}
