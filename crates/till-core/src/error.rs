//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Domain lookups and parsing failures            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-session errors (separate crate)                                  │
//! │  └── SessionError     - Snapshot ordering, prompts, configuration      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → replay host        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Blocked accountability checks are NOT errors. They are ordinary
//! outcomes ([`crate::accountability::GateOutcome::Blocked`]) that the
//! operator acknowledges.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core decision logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An event type name did not match any till-control event.
    ///
    /// ## When This Occurs
    /// - A recorded scenario or business payload names an event this
    ///   terminal build does not know about
    ///
    /// Known event types always have a void mapping, so this is the only
    /// way a void lookup can fail at runtime.
    #[error("Unknown till event type: {0}")]
    UnknownEventType(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two tender lines share a line number).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
