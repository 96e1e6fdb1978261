//! # Pricing Policy
//!
//! Derives the display price of a product from how close its nearest lot is
//! to expiry.
//!
//! ## The Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  EXPIRY DISCOUNT                                                │
//! │                                                                 │
//! │  days_to_expiry = nearest_expiry - today                        │
//! │                                                                 │
//! │  days_to_expiry <= 30  →  sale price = list price - 20%         │
//! │                           (rounded to whole cents)              │
//! │  days_to_expiry  > 30  →  sale price = list price               │
//! │  no stocked lot        →  sale price = list price               │
//! │                                                                 │
//! │  The boundary is inclusive: exactly 30 days out discounts.      │
//! │  Negative values (already expired) also discount.               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The computation is pure and side-effect free. It runs on every catalog
//! read and is never persisted, so a price can never go stale in storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::{EXPIRY_ALERT_WINDOW_DAYS, EXPIRY_DISCOUNT_BPS};

// =============================================================================
// Price Quote
// =============================================================================

/// The outcome of the pricing policy for one product.
///
/// Carries both prices so callers can render "was / now" displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// The listed unit price, unchanged.
    pub list_price: Money,
    /// The price to charge: discounted when the nearest lot is inside the
    /// window, otherwise equal to `list_price`.
    pub sale_price: Money,
    /// True when the 20% discount applied.
    pub discounted: bool,
    /// Days until the nearest stocked lot expires. `None` when the product
    /// has no stocked lot.
    pub days_to_expiry: Option<i64>,
}

impl PriceQuote {
    /// Discount percentage applied, in basis points (0 when not discounted).
    #[inline]
    pub fn discount_bps(&self) -> u32 {
        if self.discounted {
            EXPIRY_DISCOUNT_BPS
        } else {
            0
        }
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Quotes the display price for a product.
///
/// ## Arguments
/// * `list_price` - the listed unit price
/// * `nearest_expiry` - nearest expiry among the product's positive-quantity
///   lots, `None` when out of stock
/// * `today` - the reference date; always passed in, the core has no clock
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use farma_core::money::Money;
/// use farma_core::pricing::quote;
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
/// let expiry = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(); // 30 days out
///
/// let q = quote(Money::from_cents(850), Some(expiry), today);
/// assert!(q.discounted);
/// assert_eq!(q.sale_price.cents(), 680);
/// assert_eq!(q.list_price.cents(), 850);
/// ```
pub fn quote(list_price: Money, nearest_expiry: Option<NaiveDate>, today: NaiveDate) -> PriceQuote {
    let days_to_expiry = nearest_expiry.map(|expiry| (expiry - today).num_days());

    let discounted = matches!(days_to_expiry, Some(days) if days <= EXPIRY_ALERT_WINDOW_DAYS);

    let sale_price = if discounted {
        list_price.less_percentage(EXPIRY_DISCOUNT_BPS)
    } else {
        list_price
    };

    PriceQuote {
        list_price,
        sale_price,
        discounted,
        days_to_expiry,
    }
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
    fn test_discount_at_exactly_30_days() {
        let today = date(2026, 3, 1);
        let expiry = date(2026, 3, 31);

        let q = quote(Money::from_cents(1000), Some(expiry), today);
        assert!(q.discounted);
        assert_eq!(q.days_to_expiry, Some(30));
        assert_eq!(q.sale_price.cents(), 800);
        assert_eq!(q.list_price.cents(), 1000);
    }

    #[test]
    fn test_no_discount_at_31_days() {
        let today = date(2026, 3, 1);
        let expiry = date(2026, 4, 1);

        let q = quote(Money::from_cents(1000), Some(expiry), today);
        assert!(!q.discounted);
        assert_eq!(q.days_to_expiry, Some(31));
        assert_eq!(q.sale_price, q.list_price);
        assert_eq!(q.discount_bps(), 0);
    }

    #[test]
    fn test_expired_lot_still_discounts() {
        // Negative days-to-expiry satisfies days <= 30; filtering expired
        // stock out is a presentation decision, not a pricing one
        let today = date(2026, 3, 10);
        let expiry = date(2026, 3, 1);

        let q = quote(Money::from_cents(1000), Some(expiry), today);
        assert!(q.discounted);
        assert_eq!(q.days_to_expiry, Some(-9));
    }

    #[test]
    fn test_out_of_stock_quotes_list_price() {
        let q = quote(Money::from_cents(1000), None, date(2026, 3, 1));
        assert!(!q.discounted);
        assert_eq!(q.days_to_expiry, None);
        assert_eq!(q.sale_price.cents(), 1000);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // R$ 45.90 at 20% off is R$ 36.72 exactly
        let today = date(2026, 3, 1);
        let expiry = date(2026, 3, 15);

        let q = quote(Money::from_cents(4590), Some(expiry), today);
        assert_eq!(q.sale_price.cents(), 3672);

        // R$ 10.99: discount 2.198 rounds to 2.20, sale price 8.79
        let q = quote(Money::from_cents(1099), Some(expiry), today);
        assert_eq!(q.sale_price.cents(), 879);
    }
}
