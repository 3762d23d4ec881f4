//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Order rule violations                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── OrderRejection   - Why the Ledger aborted an order                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → OrderRejection → caller           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while planning an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The order has no lines.
    #[error("Order must contain at least one line")]
    EmptyOrder,

    /// The order has more lines than a single transaction accepts.
    #[error("Order cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// A line asks for zero or a negative quantity.
    ///
    /// `line` is the zero-based position in the order as submitted.
    #[error("Line {line}: quantity must be positive, got {quantity}")]
    InvalidQuantity { line: usize, quantity: i64 },

    /// A line references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete the order.
    ///
    /// ## User Workflow
    /// ```text
    /// Order line (qty: 5)
    ///      │
    ///      ▼
    /// Locked stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Rice 5kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Rice 5kg in stock"
    /// ```
    #[error(
        "Insufficient stock for {product_name}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before anything touches the store.
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

    /// Invalid format (e.g., invalid UUID, postal code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
            product_id: "p-1".to_string(),
            product_name: "Rice 5kg".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Rice 5kg: available 1, requested 2"
        );

        let err = CoreError::InvalidQuantity {
            line: 2,
            quantity: 0,
        };
        assert_eq!(err.to_string(), "Line 2: quantity must be positive, got 0");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "category".to_string(),
        };
        assert_eq!(err.to_string(), "category is required");

        let err = ValidationError::InvalidFormat {
            field: "postal code".to_string(),
            reason: "must be 8 digits".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "postal code has invalid format: must be 8 digits"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
