//! # Validation Module
//!
//! Input validation for values that come from outside the terminal:
//! scanned drawer keys, tender lines delivered by the business layer, and
//! store tender configuration.
//!
//! ## Usage
//! ```rust
//! use till_core::validation::validate_drawer_key;
//!
//! assert!(validate_drawer_key("DRAWER-01").is_ok());
//! assert!(validate_drawer_key("").is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{TenderDefinitions, TenderDisplayLine};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest drawer key a scanner can produce.
pub const MAX_DRAWER_KEY_LEN: usize = 32;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a scanned or typed drawer key.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 32 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ```rust
/// use till_core::validation::validate_drawer_key;
///
/// assert!(validate_drawer_key("till_7").is_ok());
/// assert!(validate_drawer_key("till 7").is_err());
/// assert!(validate_drawer_key(&"K".repeat(40)).is_err());
/// ```
pub fn validate_drawer_key(key: &str) -> ValidationResult<()> {
    let key = key.trim();

    if key.is_empty() {
        return Err(ValidationError::Required {
            field: "drawer key".to_string(),
        });
    }

    if key.chars().count() > MAX_DRAWER_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "drawer key".to_string(),
            max: MAX_DRAWER_KEY_LEN,
        });
    }

    if !key
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "drawer key".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the tender lines of one transaction.
///
/// Line numbers must be unique; "last tender" selection depends on it.
pub fn validate_tender_lines(lines: &[TenderDisplayLine]) -> ValidationResult<()> {
    let mut seen = HashSet::new();

    for line in lines {
        if line.tender_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("tender id of line {}", line.line_number),
            });
        }
        if !seen.insert(line.line_number) {
            return Err(ValidationError::Duplicate {
                field: "line number".to_string(),
                value: line.line_number.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates store tender configuration: non-empty, unique tender ids.
pub fn validate_tender_definitions(definitions: &TenderDefinitions) -> ValidationResult<()> {
    let mut seen = HashSet::new();

    for definition in definitions.iter() {
        let id = definition.tender_id.trim();
        if id.is_empty() {
            return Err(ValidationError::Required {
                field: "tender id".to_string(),
            });
        }
        if !seen.insert(id) {
            return Err(ValidationError::Duplicate {
                field: "tender id".to_string(),
                value: id.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
