//! # Error Types
//!
//! Domain-specific error types for farma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Error Types                             │
//! │                                                                 │
//! │  farma-core errors (this file)                                  │
//! │  ├── SaleError        - Sale attempt failures (the taxonomy     │
//! │  │                      surfaced to callers)                    │
//! │  └── ValidationError  - Field-level input failures              │
//! │                                                                 │
//! │  farma-db errors (separate crate)                               │
//! │  └── DbError          - Database operation failures             │
//! │                                                                 │
//! │  Flow: ValidationError → SaleError::InvalidRequest              │
//! │        DbError         → SaleError::Storage                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, quantity, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Sale Error
// =============================================================================

/// Failure of a sale attempt, or of any catalog operation that shares the
/// taxonomy.
///
/// `InvalidRequest` and `AuthorizationDenied` are detected before any
/// mutation and never require rollback. `InsufficientStock` aborts the
/// attempt with no partial writes. `Storage` means the commit transaction
/// was rolled back; the caller may resubmit the identical cart.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Malformed input: empty cart, non-positive quantity, unknown product,
    /// missing or badly formatted prescription proof.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Supervisor release code missing or it does not match the configured
    /// master value.
    #[error("authorization denied: supervisor code missing or incorrect")]
    AuthorizationDenied,

    /// No single lot of the product holds enough stock for the requested
    /// quantity (strict FEFO, no multi-lot splits), or the decrement lost a
    /// race at commit time.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line: product 3, qty 5
    ///      │
    ///      ▼
    /// FEFO over lots: best candidate holds 3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 3, requested: 5 }
    /// ```
    #[error("insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: i64, requested: i64 },

    /// Persistence failure. The whole transaction was rolled back: no sale
    /// header, no lines, no stock decrements survive. Retryable.
    #[error("transaction failed: {0}")]
    Storage(String),
}

/// Field validation failures fold into the `InvalidRequest` kind: callers
/// match on exactly four taxonomy variants.
impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::InvalidRequest(err.to_string())
    }
}

impl SaleError {
    /// Convenience constructor for `InvalidRequest`.
    pub fn invalid(reason: impl Into<String>) -> Self {
        SaleError::InvalidRequest(reason.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be a positive integer.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. unsupported prescription file type).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with SaleError.
pub type SaleResult<T> = Result<T, SaleError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SaleError::InsufficientStock {
            product_id: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for product 3: requested 5"
        );

        let err = SaleError::invalid("cart is empty");
        assert_eq!(err.to_string(), "invalid request: cart is empty");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "lot_number".to_string(),
        };
        assert_eq!(err.to_string(), "lot_number is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_invalid_request() {
        let validation_err = ValidationError::Required {
            field: "lot_number".to_string(),
        };
        let sale_err: SaleError = validation_err.into();
        assert!(matches!(sale_err, SaleError::InvalidRequest(_)));
        assert_eq!(sale_err.to_string(), "invalid request: lot_number is required");
    }
}
