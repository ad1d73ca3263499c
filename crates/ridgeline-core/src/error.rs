//! # Error Types
//!
//! Domain-specific error types for ridgeline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  ridgeline-core errors (this file)                                  │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  ridgeline-db errors (separate crate)                               │
//! │  └── DbError          - Conflicts + infrastructure failures         │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → presentation         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (article id, state, ...)
//! 3. Errors are enum variants, never strings

use thiserror::Error;

use crate::types::RentalState;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// These are rejected before or during a workflow operation; none of them
/// leaves a partial write behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds the article's available stock.
    ///
    /// Raised inside the creation transaction by the guarded decrement, so
    /// concurrent reservations can never drive stock negative.
    #[error("insufficient stock for article {article_id}: available {available}, requested {requested}")]
    InsufficientStock {
        article_id: i64,
        available: i64,
        requested: i64,
    },

    /// The rental is in a state that does not allow the operation.
    ///
    /// ## When This Occurs
    /// - cancelling a rental that is already cancelled or returned
    /// - changing dates after the equipment went out
    /// - marking an already-returned rental as returned a second time
    #[error("rental {rental_id} is {state:?}, cannot {operation}")]
    StateConflict {
        rental_id: i64,
        state: RentalState,
        operation: &'static str,
    },

    /// Validation error (wraps [`ValidationError`]).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database access; the store is never touched when one of
/// these fires.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Invalid format (e.g. postal code, email shape).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// A rental period ending before it starts.
    #[error("rental period ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            article_id: 7,
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for article 7: available 3, requested 5"
        );
    }

    #[test]
    fn state_conflict_message() {
        let err = CoreError::StateConflict {
            rental_id: 12,
            state: RentalState::Cancelled,
            operation: "cancel",
        };
        assert_eq!(err.to_string(), "rental 12 is Cancelled, cannot cancel");
    }

    #[test]
    fn validation_converts_to_core_error() {
        let err: CoreError = ValidationError::Required { field: "name" }.into();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
