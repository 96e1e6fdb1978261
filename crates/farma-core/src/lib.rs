//! # farma-core: Pure Business Logic for FarmaPOS
//!
//! This crate is the **heart** of FarmaPOS. It contains all business rules
//! of the pharmacy stock/sale system as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     FarmaPOS Architecture                       │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │              Presentation layer (not this repo)           │  │
//! │  │        catalog views, POS screen, stock admin forms       │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │               ★ farma-core (THIS CRATE) ★                 │  │
//! │  │                                                           │  │
//! │  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌─────────┐ ┌────────┐  │  │
//! │  │  │ types  │ │ money  │ │  fefo  │ │ pricing │ │ valid. │  │  │
//! │  │  │Product │ │ Money  │ │ select │ │  quote  │ │  gate  │  │  │
//! │  │  │Lot,Sale│ │ cents  │ │  _lot  │ │ 20%/30d │ │ checks │  │  │
//! │  │  └────────┘ └────────┘ └────────┘ └─────────┘ └────────┘  │  │
//! │  │                                                           │  │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS        │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │                 farma-db (Storage Layer)                  │  │
//! │  │      SQLite repositories, migrations, sale engine         │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Lot, Sale, Operator, ...)
//! - [`money`] - Money type with integer cent arithmetic (no floats!)
//! - [`error`] - The sale error taxonomy and validation errors
//! - [`fefo`] - First-Expire-First-Out lot selection
//! - [`pricing`] - Expiry-proximity discount policy
//! - [`validation`] - Input validation and the controlled-sale gate
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: deterministic, same input = same output
//! 2. **No ambient state**: "today" and the sale policy are always
//!    explicit parameters
//! 3. **Integer money**: all monetary values are cents (i64)
//! 4. **Explicit errors**: typed enums, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fefo;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use farma_core::Money` instead of
// `use farma_core::money::Money`

pub use error::{SaleError, SaleResult, ValidationError};
pub use money::Money;
pub use pricing::PriceQuote;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Window, in days, for both the expiry alert and the automatic discount.
///
/// A lot expiring within this many days (inclusive) shows up in the expiry
/// alert and triggers the discount on its product's display price.
pub const EXPIRY_ALERT_WINDOW_DAYS: i64 = 30;

/// Automatic discount applied inside the expiry window, in basis points.
/// 2000 bps = 20%.
pub const EXPIRY_DISCOUNT_BPS: u32 = 2000;

/// Accepted prescription proof file formats. Checked against the file name
/// extension only; the file itself is never stored.
pub const PRESCRIPTION_FORMATS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Maximum quantity of a single cart line.
///
/// Guards against typos at the counter (1000 keyed instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
