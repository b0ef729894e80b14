//! # Error Types
//!
//! Domain-specific error types for apotheca-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  apotheca-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  apotheca-db errors (separate crate)                                    │
//! │  └── DbError          - Document store failures                         │
//! │                                                                         │
//! │  backoffice errors (in app)                                             │
//! │  └── ApiError         - What the operator sees (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages that the counter staff already know from the old screens are
//! kept word for word ("Not enough stock available.", "Please enter a
//! valid amount.", ...).

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Selling more units than are on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (Panadol, 3 packs of 10)
    ///      │
    ///      ▼
    /// Check stock: 25 tabs on hand, 30 requested
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Panadol", available: 25, requested: 30 }
    /// ```
    ///
    /// `available` and `requested` are in tabs (the stock unit).
    #[error("Not enough stock available. {product}: {available} tabs on hand, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A debit would take a ledger account below zero.
    #[error("Insufficient balance in {account}.")]
    InsufficientBalance {
        account: String,
        available: Money,
        requested: Money,
    },

    /// Settlement attempted with nothing in the cart.
    #[error("Please add items to the cart before generating the bill.")]
    EmptyCart,

    /// Checkout operation not allowed in the current state.
    #[error("Checkout is {actual}, expected {expected}")]
    InvalidCheckoutState { expected: String, actual: String },

    /// Cart line index out of range.
    #[error("Cart line {0} does not exist")]
    LineNotFound(usize),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write so a rejected form never leaves partial state.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Several required fields are missing (vendor form).
    #[error("All fields are required")]
    AllFieldsRequired,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Ledger/expense amount missing, zero or negative.
    #[error("Please enter a valid amount.")]
    InvalidAmount,

    /// Cart line without a product or with a non-positive quantity.
    #[error("Please select a valid product and quantity.")]
    InvalidLine,

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Panadol".to_string(),
            available: 25,
            requested: 30,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock available. Panadol: 25 tabs on hand, 30 requested"
        );

        let err = CoreError::InsufficientBalance {
            account: "JazzCash".to_string(),
            available: Money::from_minor(100),
            requested: Money::from_minor(500),
        };
        assert_eq!(err.to_string(), "Insufficient balance in JazzCash.");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::InvalidAmount.to_string(),
            "Please enter a valid amount."
        );
        assert_eq!(
            ValidationError::AllFieldsRequired.to_string(),
            "All fields are required"
        );
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::InvalidLine.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(
            core_err.to_string(),
            "Please select a valid product and quantity."
        );
    }
}
