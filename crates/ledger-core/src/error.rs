//! # Error Types
//!
//! Domain-specific error types for ledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ledger-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  │   ├── Overpayment      payment exceeds remaining balance            │
//! │  │   ├── InvalidAmount    payment amount <= 0                          │
//! │  │   ├── InvalidState     illegal sale / credit note transition        │
//! │  │   └── Validation       wraps ValidationError                        │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  ledger-service errors (separate crate)                                │
//! │  └── ServiceError     - NotFound, VersionConflict, config failures     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → UI                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is recoverable by the caller. No ledger operation leaves a
//! half-built value behind: inputs are validated in full before the new
//! `Sale` or `CreditNote` is constructed.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Payment would push the remaining balance below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale remaining: RD$600.00
    ///      │
    ///      ▼
    /// add_payment(RD$600.01)
    ///      │
    ///      ▼
    /// Overpayment { amount: 600.01, remaining: 600.00 }
    ///      │
    ///      ▼
    /// UI shows: "Payment exceeds the remaining balance"
    /// ```
    #[error("Payment of {amount} exceeds remaining balance {remaining} on sale {sale_id}")]
    Overpayment {
        sale_id: String,
        amount: Money,
        remaining: Money,
    },

    /// Payment amount is zero or negative.
    #[error("Invalid payment amount: {amount} (must be greater than zero)")]
    InvalidAmount { amount: Money },

    /// Entity is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Applying or cancelling a credit note that is no longer pending
    /// - Deleting an applied or cancelled credit note
    /// - Paying or crediting a cancelled sale
    /// - Cancelling a sale twice
    #[error("{entity} {id} is {current}, cannot {operation}")]
    InvalidState {
        entity: String,
        id: String,
        current: String,
        operation: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: impl Into<String>,
        id: impl Into<String>,
        current: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidState {
            entity: entity.into(),
            id: id.into(),
            current: current.into(),
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two amounts that must agree do not.
    ///
    /// ## When This Occurs
    /// - Mixed sale: cash + credit portions differ from the sale total
    /// - Credit note applied to a sale of another client
    #[error("{field} mismatch: expected {expected}, got {actual}")]
    Mismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Field is not allowed in this context.
    #[error("{field} is not allowed: {reason}")]
    NotAllowed { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates a Mismatch error from any displayable pair.
    pub fn mismatch(
        field: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        ValidationError::Mismatch {
            field: field.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
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
    fn test_overpayment_message() {
        let err = CoreError::Overpayment {
            sale_id: "V-1".to_string(),
            amount: Money::from_cents(60001),
            remaining: Money::from_cents(60000),
        };
        assert_eq!(
            err.to_string(),
            "Payment of RD$600.01 exceeds remaining balance RD$600.00 on sale V-1"
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("Credit note", "NC-1", "aplicada", "apply");
        assert_eq!(err.to_string(), "Credit note NC-1 is aplicada, cannot apply");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("items").to_string(), "items is required");

        let err = ValidationError::mismatch("mixed split", "RD$1,000.00", "RD$900.00");
        assert_eq!(
            err.to_string(),
            "mixed split mismatch: expected RD$1,000.00, got RD$900.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("client_id").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
