//! # Validation Module
//!
//! Input validation and sale precondition checks for FarmaPOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                          │
//! │                                                                 │
//! │  Layer 1: Presentation (forms, request parsing)                 │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  Layer 2: THIS MODULE - field checks and the controlled-sale    │
//! │           gate, all before any mutation                         │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  Layer 3: Database - NOT NULL / CHECK / FK constraints and the  │
//! │           conditional decrement                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field validators return [`ValidationError`]; the controlled-sale gate
//! returns the [`SaleError`] taxonomy directly, because a wrong supervisor
//! code must surface as `AuthorizationDenied` and never as a generic
//! validation failure.

use crate::error::{SaleError, SaleResult, ValidationError};
use crate::types::{CartLine, PrescriptionProof, SalePolicy};
use crate::{MAX_LINE_QUANTITY, PRESCRIPTION_FORMATS};

/// Result type for field validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or manufacturer name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most 200 characters
pub fn validate_name(field: &'static str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a manufacturer lot number.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
///
/// ## Example
/// ```rust
/// use farma_core::validation::validate_lot_number;
///
/// assert!(validate_lot_number("LOT2026001").is_ok());
/// assert!(validate_lot_number("   ").is_err());
/// ```
pub fn validate_lot_number(lot_number: &str) -> ValidationResult<()> {
    let lot_number = lot_number.trim();

    if lot_number.is_empty() {
        return Err(ValidationError::Required {
            field: "lot_number".to_string(),
        });
    }

    if lot_number.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "lot_number".to_string(),
            max: 50,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an initial lot stock quantity.
///
/// Zero is allowed: a lot may be registered ahead of receiving stock.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (bonus items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validation
// =============================================================================

/// Validates a submitted cart before the sale engine touches storage.
///
/// ## Rules
/// - Cart must be non-empty
/// - Every line quantity must pass [`validate_quantity`]
/// - Every line price must pass [`validate_price_cents`]
pub fn validate_cart(cart: &[CartLine]) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::Required {
            field: "cart".to_string(),
        });
    }

    for line in cart {
        validate_quantity(line.quantity)?;
        validate_price_cents(line.unit_price_cents)?;
    }

    Ok(())
}

// =============================================================================
// Controlled-Sale Gate
// =============================================================================

/// Validates a prescription proof's format.
///
/// Only the file name is examined: the extension must be in the allowed
/// set. The content is never read or persisted.
pub fn validate_prescription(proof: &PrescriptionProof) -> ValidationResult<()> {
    match proof.extension() {
        Some(ext) if PRESCRIPTION_FORMATS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "prescription".to_string(),
            reason: format!("file type must be one of: {}", PRESCRIPTION_FORMATS.join(", ")),
        }),
    }
}

/// Enforces the controlled-category sale gate.
///
/// Call with `controlled = true` when any cart line's product is in the
/// controlled category. Checks run in order:
///
/// 1. A supervisor release code must be present and match the policy's
///    master value exactly (case-sensitive). Failure is
///    `AuthorizationDenied`, never a generic error.
/// 2. A prescription proof must be present and pass the format check.
///    Failure is `InvalidRequest`.
///
/// Both checks happen before any allocation or mutation.
pub fn check_controlled_gate(
    controlled: bool,
    supervisor_auth: Option<&str>,
    prescription: Option<&PrescriptionProof>,
    policy: &SalePolicy,
) -> SaleResult<()> {
    if !controlled {
        return Ok(());
    }

    match supervisor_auth {
        Some(code) if !code.is_empty() && code == policy.supervisor_code => {}
        _ => return Err(SaleError::AuthorizationDenied),
    }

    match prescription {
        Some(proof) => validate_prescription(proof)?,
        None => {
            return Err(SaleError::invalid(
                "controlled product requires a prescription proof",
            ))
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
