//! # Domain Types
//!
//! Core domain types used throughout FarmaPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                            │
//! │                                                                 │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐     │
//! │  │    Product    │   │      Lot      │   │     Sale      │     │
//! │  │  ───────────  │   │  ───────────  │   │  ───────────  │     │
//! │  │  id (i64)     │1─N│  product_id   │   │  id (i64)     │     │
//! │  │  category     │   │  expiry_date  │   │  total_cents  │     │
//! │  │  price_cents  │   │  quantity     │   │  operator_id  │     │
//! │  └───────────────┘   └───────┬───────┘   └───────┬───────┘     │
//! │                              │1                  │1            │
//! │                              │N                  │N            │
//! │                      ┌───────┴──────────────────┴───────┐      │
//! │                      │            SaleLine              │      │
//! │                      │  product_id, lot_id, quantity,   │      │
//! │                      │  unit_price_cents, subtotal      │      │
//! │                      └──────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A product's stock is the sum of its lots' quantities. Lots are the unit
//! of stock: sales always draw from a specific lot, chosen FEFO.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::PriceQuote;
use crate::EXPIRY_ALERT_WINDOW_DAYS;

// =============================================================================
// Category
// =============================================================================

/// Regulatory category of a product.
///
/// `Controlled` products cannot be sold without a supervisor release code
/// and a prescription proof (see the sale engine preconditions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Over-the-counter products, no sale restrictions.
    Common,
    /// Black-stripe controlled medication: supervisor + prescription gate.
    Controlled,
    /// Antibiotics, sold under prescription.
    Antibiotic,
    /// Hygiene and personal care.
    Hygiene,
}

impl Category {
    /// Whether selling this category requires the supervisor/prescription
    /// gate.
    #[inline]
    pub const fn is_controlled(&self) -> bool {
        matches!(self, Category::Controlled)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Stock is never stored on the product row. It is always derived from the
/// product's lots, so the catalog and the allocator can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (SQLite rowid).
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Manufacturer / laboratory name.
    pub manufacturer: String,

    /// Regulatory category.
    pub category: Category,

    /// Listed unit sale price in cents.
    pub price_cents: i64,

    /// Optional free-text description.
    pub description: Option<String>,

    /// When the product was registered.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the listed price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether this product triggers the controlled-sale gate.
    #[inline]
    pub fn is_controlled(&self) -> bool {
        self.category.is_controlled()
    }
}

// =============================================================================
// Lot
// =============================================================================

/// A dated stock lot (batch) of a product.
///
/// Invariant: `quantity >= 0` at all times. The only mutation the core ever
/// performs on a lot is the conditional decrement during sale commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lot {
    /// Unique identifier (SQLite rowid). FEFO ties break to the lowest id.
    pub id: i64,

    /// The product this lot belongs to.
    pub product_id: i64,

    /// Manufacturer lot number printed on the packaging.
    pub lot_number: String,

    /// Expiry date of every unit in this lot.
    pub expiry_date: NaiveDate,

    /// Units remaining.
    pub quantity: i64,

    /// When the lot was received.
    pub created_at: DateTime<Utc>,
}

impl Lot {
    /// Signed number of days until this lot expires, negative once past.
    #[inline]
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }
}

/// A lot annotated for display: days to expiry and the alert flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotView {
    pub id: i64,
    pub product_id: i64,
    pub lot_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    /// Days until expiry relative to the reference date, negative once past.
    pub days_to_expiry: i64,
    /// True when the lot expires within the 30-day alert window.
    pub expiring_soon: bool,
}

impl LotView {
    /// Annotates a lot against a reference date.
    pub fn new(lot: Lot, today: NaiveDate) -> Self {
        let days = lot.days_to_expiry(today);
        LotView {
            id: lot.id,
            product_id: lot.product_id,
            lot_number: lot.lot_number,
            expiry_date: lot.expiry_date,
            quantity: lot.quantity,
            days_to_expiry: days,
            expiring_soon: days <= EXPIRY_ALERT_WINDOW_DAYS,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale transaction header.
///
/// Sales and their lines are created atomically at commit time and never
/// mutated afterwards. A cancellation would be a new compensating
/// transaction, not an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub sold_at: DateTime<Utc>,
    /// Sum of quantity x unit price across all lines, in cents.
    pub total_cents: i64,
    /// Operator who rang the sale up.
    pub operator_id: i64,
    /// Supervisor release code, present when the cart held a controlled
    /// product. Stored verbatim.
    pub supervisor_auth: Option<String>,
}

/// A line item of a sale, frozen at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// The specific lot this line was fulfilled from.
    pub lot_id: i64,
    pub quantity: i64,
    /// Unit price at time of sale, in cents.
    pub unit_price_cents: i64,
    /// quantity x unit_price_cents.
    pub subtotal_cents: i64,
}

impl SaleLine {
    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A recent-sales listing row: the sale joined with its operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleSummary {
    pub id: i64,
    pub sold_at: DateTime<Utc>,
    pub total_cents: i64,
    pub operator_name: String,
    pub operator_role: Role,
    pub supervisor_auth: Option<String>,
}

// =============================================================================
// Operator
// =============================================================================

/// Role of a pharmacy operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Clerk,
    Pharmacist,
    Manager,
}

/// A pharmacy operator. Authentication and password material live in the
/// presentation layer; the core only records who performed an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Operator {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub role: Role,
}

// =============================================================================
// Sale Input Types
// =============================================================================

/// One requested line of a sale, as submitted by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    /// Units requested. Must be a positive integer.
    pub quantity: i64,
    /// Unit price agreed at the counter, in cents.
    pub unit_price_cents: i64,
}

impl CartLine {
    /// quantity x unit price for this line.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).times(self.quantity)
    }
}

/// Proof of prescription presented for a controlled sale.
///
/// Only the file name is carried: the engine checks the format against the
/// allowed set and discards it. The content is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionProof {
    pub file_name: String,
}

impl PrescriptionProof {
    pub fn new(file_name: impl Into<String>) -> Self {
        PrescriptionProof {
            file_name: file_name.into(),
        }
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Request-scoped sale policy handed to the engine at construction.
///
/// The core holds no ambient configuration: the master release code comes in
/// from whatever configuration layer embeds the engine.
#[derive(Debug, Clone)]
pub struct SalePolicy {
    /// Master supervisor release code for controlled sales.
    /// Compared byte for byte, case-sensitive.
    pub supervisor_code: String,
}

impl SalePolicy {
    pub fn new(supervisor_code: impl Into<String>) -> Self {
        SalePolicy {
            supervisor_code: supervisor_code.into(),
        }
    }
}

// =============================================================================
// Catalog View Types
// =============================================================================

/// A catalog listing row: the product with aggregated stock and the price
/// quote derived from its nearest expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub category: Category,
    pub description: Option<String>,
    /// Sum of quantities across the product's positive-quantity lots.
    pub stock_total: i64,
    /// Nearest upcoming expiry among positive-quantity lots.
    pub nearest_expiry: Option<NaiveDate>,
    /// Display price derived from expiry proximity.
    pub quote: PriceQuote,
}

/// An expiry-alert row: a lot joined with its product identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringLot {
    pub lot_id: i64,
    pub product_name: String,
    pub manufacturer: String,
    pub lot_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub days_to_expiry: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_category_controlled() {
        assert!(Category::Controlled.is_controlled());
        assert!(!Category::Common.is_controlled());
        assert!(!Category::Antibiotic.is_controlled());
        assert!(!Category::Hygiene.is_controlled());
    }

    #[test]
    fn test_lot_days_to_expiry() {
        let lot = Lot {
            id: 1,
            product_id: 1,
            lot_number: "LOT001".to_string(),
            expiry_date: date(2026, 3, 31),
            quantity: 10,
            created_at: Utc::now(),
        };

        assert_eq!(lot.days_to_expiry(date(2026, 3, 1)), 30);
        assert_eq!(lot.days_to_expiry(date(2026, 3, 31)), 0);
        assert_eq!(lot.days_to_expiry(date(2026, 4, 5)), -5);
    }

    #[test]
    fn test_lot_view_alert_flag() {
        let lot = Lot {
            id: 7,
            product_id: 1,
            lot_number: "LOT002".to_string(),
            expiry_date: date(2026, 3, 31),
            quantity: 5,
            created_at: Utc::now(),
        };

        let soon = LotView::new(lot.clone(), date(2026, 3, 10));
        assert!(soon.expiring_soon);
        assert_eq!(soon.days_to_expiry, 21);

        let far = LotView::new(lot, date(2026, 1, 1));
        assert!(!far.expiring_soon);
    }

    #[test]
    fn test_cart_line_total() {
        let line = CartLine {
            product_id: 1,
            quantity: 3,
            unit_price_cents: 690,
        };
        assert_eq!(line.line_total().cents(), 2070);
    }

    #[test]
    fn test_enum_json_shape() {
        // These strings are the DTO contract with any embedding
        // presentation layer and with the database TEXT columns
        assert_eq!(
            serde_json::to_string(&Category::Controlled).unwrap(),
            r#""controlled""#
        );
        assert_eq!(serde_json::to_string(&Role::Pharmacist).unwrap(), r#""pharmacist""#);

        let back: Category = serde_json::from_str(r#""antibiotic""#).unwrap();
        assert_eq!(back, Category::Antibiotic);
    }

    #[test]
    fn test_prescription_extension() {
        assert_eq!(
            PrescriptionProof::new("receita.PDF").extension().as_deref(),
            Some("pdf")
        );
        assert_eq!(
            PrescriptionProof::new("scan.final.jpeg")
                .extension()
                .as_deref(),
            Some("jpeg")
        );
        assert_eq!(PrescriptionProof::new("no_extension").extension(), None);
        assert_eq!(PrescriptionProof::new("trailing.").extension(), None);
    }
}
