//! # FEFO Lot Allocator
//!
//! First-Expire-First-Out selection: which lot should a sale line draw from?
//!
//! ## The Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  STRICT FEFO AT LOT GRANULARITY                                 │
//! │                                                                 │
//! │  Lots of product 3, requesting quantity 2:                      │
//! │                                                                 │
//! │    id │ expires in │ qty                                        │
//! │    ───┼────────────┼─────                                       │
//! │    11 │   5 days   │  1    ← soonest, but cannot cover 2        │
//! │    12 │  10 days   │  3    ← SELECTED                           │
//! │    13 │  40 days   │ 100                                        │
//! │                                                                 │
//! │  One lot must cover the whole quantity. No partial fulfilment   │
//! │  across lots: if no single lot suffices the allocation fails    │
//! │  even when the sum across lots would cover it.                  │
//! │                                                                 │
//! │  Tie-break on equal expiry dates: lowest lot id wins.           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selection is a read-only decision. The sale engine performs the actual
//! decrement, re-validating availability with a conditional update, so a
//! stale selection can never drive a quantity negative.

use crate::types::Lot;

/// Selects the lot a sale line should draw from.
///
/// Returns the lot with the nearest expiry date whose remaining quantity
/// covers `quantity` entirely, breaking expiry ties toward the lowest lot
/// id. Returns `None` when no single lot suffices.
///
/// Lots with insufficient quantity are skipped, not split. Expired lots are
/// not filtered here; stock that should no longer sell is expected to be
/// pulled from the shelf (zeroed) by stock control.
pub fn select_lot<'a>(lots: &'a [Lot], quantity: i64) -> Option<&'a Lot> {
    if quantity <= 0 {
        return None;
    }

    lots.iter()
        .filter(|lot| lot.quantity >= quantity)
        .min_by_key(|lot| (lot.expiry_date, lot.id))
}

// =============================================================================
// Unit Tests
// =============================================================================
