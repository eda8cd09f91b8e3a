//! # Session Error Types
//!
//! Error types for drawer session orchestration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Snapshots    │  │     Operator input      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  StaleSnapshot  │  │  NoPendingPrompt        │ │
//! │  │  MissingFixed-  │  │  Workflow-      │  │  ChoiceNotOffered       │ │
//! │  │   DrawerKey     │  │   Mismatch      │  │  MissingDrawerKey       │ │
//! │  │  ConfigLoad/Save│  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  SessionClosed: the driver task is gone.                               │
//! │  Core and Validation wrap till-core errors unchanged.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use till_core::{CoreError, EventType, OperatorChoice, ValidationError};

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Everything that can go wrong between a snapshot arriving and a directive
/// leaving.
///
/// Snapshot and input errors leave the session untouched, so a driver can
/// log them and keep going.
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid till configuration.
    #[error("Invalid till configuration: {0}")]
    InvalidConfig(String),

    /// Terminal accountability without a drawer key bound to the terminal.
    #[error("Terminal accountability requires a fixed drawer key for this terminal")]
    MissingFixedDrawerKey,

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Snapshot Errors
    // =========================================================================
    /// A snapshot arrived out of order.
    #[error("Stale snapshot: sequence {received} after {last}")]
    StaleSnapshot { last: u64, received: u64 },

    /// A snapshot belongs to a different workflow.
    #[error("Snapshot for {actual} delivered to a {expected} session")]
    WorkflowMismatch {
        expected: EventType,
        actual: EventType,
    },

    // =========================================================================
    // Operator Input Errors
    // =========================================================================
    /// Operator input arrived while no prompt was showing.
    #[error("No prompt is waiting for operator input")]
    NoPendingPrompt,

    /// The operator picked something the prompt does not offer.
    #[error("Choice {0:?} is not offered by the current prompt")]
    ChoiceNotOffered(OperatorChoice),

    /// Retry requested before any drawer key was known.
    #[error("No drawer key has been entered for this session")]
    MissingDrawerKey,

    // =========================================================================
    // Driver Errors
    // =========================================================================
    /// The driver task has stopped.
    #[error("Drawer session is closed")]
    SessionClosed,

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SessionError {
    /// True when the session is unchanged and can accept further input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::StaleSnapshot { .. }
                | SessionError::WorkflowMismatch { .. }
                | SessionError::NoPendingPrompt
                | SessionError::ChoiceNotOffered(_)
                | SessionError::MissingDrawerKey
                | SessionError::Validation(_)
        )
    }

    /// True for configuration problems.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidConfig(_)
                | SessionError::MissingFixedDrawerKey
                | SessionError::ConfigLoadFailed(_)
                | SessionError::ConfigSaveFailed(_)
        )
    }
}
