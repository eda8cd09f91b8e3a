//! # till-session: Drawer Session Orchestration
//!
//! Holds everything around the pure `till-core` decisions that a running
//! terminal needs: per-terminal configuration, the previous snapshot, the
//! prompt on screen, and an async driver that speaks in channels.
//!
//! ## Modules
//!
//! - [`config`] - Till configuration (TOML file + environment)
//! - [`snapshot`] - Inbound snapshots and operator input, outbound directives
//! - [`session`] - [`DrawerSession`], one per workflow activation
//! - [`driver`] - Tokio task wrapper around a session
//! - [`error`] - Session error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{CashDrawerSessionState, EventType, TillWorkflow};
//! use till_session::{DrawerSession, SessionSnapshot, TillConfig};
//!
//! let workflow = TillWorkflow::new(EventType::PaidIn);
//! let mut session = DrawerSession::from_config(workflow, &TillConfig::default());
//!
//! // Outside terminal accountability the operator is asked for a drawer key.
//! let directives = session
//!     .on_snapshot(SessionSnapshot::new(1, workflow, CashDrawerSessionState::Closed))
//!     .unwrap();
//! assert_eq!(directives.len(), 1);
//! assert!(session.pending_prompt().is_some());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod driver;
pub mod error;
pub mod session;
pub mod snapshot;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{TerminalConfig, TillConfig};
pub use driver::{Outbound, SessionDriver, SessionEvent, SessionHandle};
pub use error::{SessionError, SessionResult};
pub use session::DrawerSession;
pub use snapshot::{Directive, SessionInput, SessionSnapshot};
