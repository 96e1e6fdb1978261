//! # Sale Transaction Engine
//!
//! The only mutating, multi-entity operation in FarmaPOS.
//!
//! ## Lifecycle of a Sale Attempt
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                                                                 │
//! │  Received ──► Validated ──► Allocated ──► Committed ✓           │
//! │     │             │             │                               │
//! │     │             │             └──► commit failed    ✗         │
//! │     │             └──► allocation failed              ✗         │
//! │     └──► rejected (bad cart / gate)                   ✗         │
//! │                                                                 │
//! │  Every ✗ terminal rolls back the whole attempt: no header,      │
//! │  no lines, no stock decrement survives a partial failure.       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity & Concurrency
//!
//! Allocation and commit run inside ONE sqlx transaction, so a failure at
//! any point (including mid-commit) rolls everything back when the
//! transaction is dropped.
//!
//! The transaction alone is not enough against concurrent attempts that
//! read the same lot before either writes. The serialization point is the
//! conditional decrement:
//!
//! ```sql
//! UPDATE lots SET quantity = quantity - ?q WHERE id = ?id AND quantity >= ?q
//! ```
//!
//! Check and write are one atomic statement. A stale allocation loses the
//! race by affecting zero rows, which aborts the attempt with
//! `InsufficientStock` instead of driving the quantity negative.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use farma_core::{
    fefo, validation, CartLine, Lot, Money, PrescriptionProof, Product, SaleError, SalePolicy,
    SaleResult,
};

use crate::error::DbError;

/// Maps low-level sqlx failures to the retryable taxonomy kind.
fn storage(err: sqlx::Error) -> SaleError {
    SaleError::from(DbError::from(err))
}

/// The sale transaction engine.
///
/// Holds the pool and the request-scoped sale policy; everything else
/// (cart, operator, authorization) arrives per call. Cheap to clone.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.engine(SalePolicy::new("farmacia_VS"));
///
/// let sale_id = engine
///     .submit(&cart, operator_id, Some("farmacia_VS"), Some(&proof))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
    policy: SalePolicy,
}

impl SaleEngine {
    /// Creates a new engine over a pool with the given policy.
    pub fn new(pool: SqlitePool, policy: SalePolicy) -> Self {
        SaleEngine { pool, policy }
    }

    /// Submits a sale attempt: validates the cart and the controlled-sale
    /// gate, allocates one lot per line (FEFO), and commits header, lines
    /// and stock decrements as a single unit.
    ///
    /// ## Arguments
    /// * `cart` - ordered cart lines; allocation runs in input order
    /// * `operator_id` - who is ringing the sale up
    /// * `supervisor_auth` - supervisor release code, required when any
    ///   line's product is controlled
    /// * `prescription` - prescription proof, required when any line's
    ///   product is controlled; format-checked, never persisted
    ///
    /// ## Returns
    /// The new sale id.
    ///
    /// ## Errors
    /// * [`SaleError::InvalidRequest`] - empty cart, bad quantity, unknown
    ///   product or operator, missing/invalid prescription
    /// * [`SaleError::AuthorizationDenied`] - supervisor code missing or
    ///   wrong
    /// * [`SaleError::InsufficientStock`] - no single lot covers a line, or
    ///   a concurrent sale won the decrement race
    /// * [`SaleError::Storage`] - persistence failure; rolled back,
    ///   resubmit-safe
    pub async fn submit(
        &self,
        cart: &[CartLine],
        operator_id: i64,
        supervisor_auth: Option<&str>,
        prescription: Option<&PrescriptionProof>,
    ) -> SaleResult<i64> {
        validation::validate_cart(cart)?;

        // The transaction spans every read and write of the attempt, so
        // allocation decides against current persisted state and any error
        // return below rolls the whole attempt back on drop.
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let operator: Option<i64> = sqlx::query_scalar("SELECT id FROM operators WHERE id = ?1")
            .bind(operator_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;
        if operator.is_none() {
            return Err(SaleError::invalid(format!(
                "unknown operator: {operator_id}"
            )));
        }

        // Resolve products up front: unknown ids and the controlled flag
        // are preconditions, checked before anything is written.
        let mut controlled = false;
        for line in cart {
            let product: Option<Product> = sqlx::query_as(
                r#"
                SELECT id, name, manufacturer, category, price_cents, description, created_at
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;

            match product {
                Some(p) => controlled = controlled || p.is_controlled(),
                None => {
                    return Err(SaleError::invalid(format!(
                        "unknown product: {}",
                        line.product_id
                    )))
                }
            }
        }

        validation::check_controlled_gate(controlled, supervisor_auth, prescription, &self.policy)?;

        debug!(lines = cart.len(), controlled, "Sale attempt validated");

        // Allocation phase: one FEFO decision per line, in input order,
        // against the lots as this transaction sees them.
        let mut allocated_lots: Vec<i64> = Vec::with_capacity(cart.len());
        for line in cart {
            let lots: Vec<Lot> = sqlx::query_as(
                r#"
                SELECT id, product_id, lot_number, expiry_date, quantity, created_at
                FROM lots
                WHERE product_id = ?1 AND quantity > 0
                ORDER BY expiry_date ASC, id ASC
                "#,
            )
            .bind(line.product_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(storage)?;

            let lot =
                fefo::select_lot(&lots, line.quantity).ok_or(SaleError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                })?;

            debug!(
                product_id = line.product_id,
                lot_id = lot.id,
                quantity = line.quantity,
                "Line allocated"
            );
            allocated_lots.push(lot.id);
        }

        // Commit phase: header, lines, decrements. Still the same
        // transaction; any failure from here rolls all of it back.
        let total = cart
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.line_total());
        let sold_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sales (sold_at, total_cents, operator_id, supervisor_auth)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(sold_at)
        .bind(total.cents())
        .bind(operator_id)
        .bind(supervisor_auth)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        let sale_id = result.last_insert_rowid();

        for (line, lot_id) in cart.iter().zip(&allocated_lots) {
            sqlx::query(
                r#"
                INSERT INTO sale_lines
                    (sale_id, product_id, lot_id, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(*lot_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total().cents())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

            // Conditional decrement: check and apply in one atomic
            // statement. Zero rows affected means the allocation went
            // stale between the FEFO read and here.
            let updated = sqlx::query(
                r#"
                UPDATE lots
                SET quantity = quantity - ?2
                WHERE id = ?1 AND quantity >= ?2
                "#,
            )
            .bind(*lot_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

            if updated.rows_affected() == 0 {
                return Err(SaleError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                });
            }
        }

        tx.commit().await.map_err(storage)?;

        info!(
            sale_id,
            operator_id,
            total = %total,
            lines = cart.len(),
            "Sale committed"
        );

        Ok(sale_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use farma_core::{Category, Role};

    const SUPERVISOR: &str = "farmacia_VS";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(product_id: i64, quantity: i64, unit_price_cents: i64) -> CartLine {
        CartLine {
            product_id,
            quantity,
            unit_price_cents,
        }
    }

    /// In-memory database with one clerk operator. Returns (db, operator_id).
    async fn test_db() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let operator_id = db
            .operators()
            .insert("Carlos Lima", "carlos", Role::Clerk)
            .await
            .unwrap();
        (db, operator_id)
    }

    fn engine(db: &Database) -> SaleEngine {
        db.engine(SalePolicy::new(SUPERVISOR))
    }

    async fn common_product(db: &Database, name: &str, price_cents: i64) -> i64 {
        db.products()
            .create(name, "EMS", Category::Common, price_cents, None)
            .await
            .unwrap()
    }

    async fn lot_qty(db: &Database, lot_id: i64) -> i64 {
        db.lots().get(lot_id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_single_line_sale_commits_header_line_and_decrement() {
        let (db, op) = test_db().await;
        let pid = common_product(&db, "Dipirona 500mg", 850).await;
        let lot_id = db
            .lots()
            .insert(pid, "LOT001", date(2026, 9, 1), 100)
            .await
            .unwrap();

        let sale_id = engine(&db)
            .submit(&[line(pid, 3, 850)], op, None, None)
            .await
            .unwrap();

        let sale = db.sales().get(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_cents, 2550);
        assert_eq!(sale.operator_id, op);
        assert_eq!(sale.supervisor_auth, None);

        let lines = db.sales().lines(sale_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].lot_id, lot_id);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].subtotal_cents, 2550);

        assert_eq!(lot_qty(&db, lot_id).await, 97);
    }

    #[tokio::test]
    async fn test_multi_line_total_is_sum_of_lines() {
        let (db, op) = test_db().await;
        let p1 = common_product(&db, "Dipirona 500mg", 850).await;
        let p2 = common_product(&db, "Paracetamol 750mg", 690).await;
        db.lots().insert(p1, "L1", date(2026, 9, 1), 10).await.unwrap();
        db.lots().insert(p2, "L2", date(2026, 9, 1), 10).await.unwrap();

        let cart = [line(p1, 2, 850), line(p2, 3, 690)];
        let sale_id = engine(&db).submit(&cart, op, None, None).await.unwrap();

        let sale = db.sales().get(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_cents, 2 * 850 + 3 * 690);

        let lines = db.sales().lines(sale_id).await.unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_fefo_skips_soonest_lot_without_enough_stock() {
        let (db, op) = test_db().await;
        let pid = common_product(&db, "Ibuprofeno 400mg", 1200).await;

        // Expiries [10d, 40d, 5d] with quantities [3, 100, 1]
        let base = date(2026, 3, 1);
        let ten_days = db
            .lots()
            .insert(pid, "TEN", base + chrono::Duration::days(10), 3)
            .await
            .unwrap();
        let forty_days = db
            .lots()
            .insert(pid, "FORTY", base + chrono::Duration::days(40), 100)
            .await
            .unwrap();
        let five_days = db
            .lots()
            .insert(pid, "FIVE", base + chrono::Duration::days(5), 1)
            .await
            .unwrap();

        let sale_id = engine(&db)
            .submit(&[line(pid, 2, 1200)], op, None, None)
            .await
            .unwrap();

        // The 5-day lot cannot cover 2; the 10-day lot is drawn, never the
        // 40-day lot
        let lines = db.sales().lines(sale_id).await.unwrap();
        assert_eq!(lines[0].lot_id, ten_days);

        assert_eq!(lot_qty(&db, ten_days).await, 1);
        assert_eq!(lot_qty(&db, five_days).await, 1);
        assert_eq!(lot_qty(&db, forty_days).await, 100);
    }

    #[tokio::test]
    async fn test_no_single_lot_sufficient_even_if_sum_is() {
        let (db, op) = test_db().await;
        let pid = common_product(&db, "Dipirona 500mg", 850).await;
        db.lots().insert(pid, "A", date(2026, 5, 1), 3).await.unwrap();
        db.lots().insert(pid, "B", date(2026, 6, 1), 3).await.unwrap();

        let err = engine(&db)
            .submit(&[line(pid, 5, 850)], op, None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SaleError::InsufficientStock {
                product_id,
                requested: 5,
            } if product_id == pid
        ));
    }

    #[tokio::test]
    async fn test_two_line_failure_leaves_first_lot_untouched() {
        let (db, op) = test_db().await;
        let p1 = common_product(&db, "Dipirona 500mg", 850).await;
        let p2 = common_product(&db, "Paracetamol 750mg", 690).await;
        let l1 = db.lots().insert(p1, "L1", date(2026, 9, 1), 10).await.unwrap();
        db.lots().insert(p2, "L2", date(2026, 9, 1), 1).await.unwrap();

        // Line 1 would allocate fine; line 2 cannot
        let cart = [line(p1, 2, 850), line(p2, 5, 690)];
        let err = engine(&db).submit(&cart, op, None, None).await.unwrap_err();
        assert!(matches!(err, SaleError::InsufficientStock { .. }));

        // No partial writes: lot untouched, no header, no lines
        assert_eq!(lot_qty(&db, l1).await, 10);
        assert!(db.sales().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_invalid_request() {
        let (db, op) = test_db().await;
        let err = engine(&db).submit(&[], op, None, None).await.unwrap_err();
        assert!(matches!(err, SaleError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_product_is_invalid_request() {
        let (db, op) = test_db().await;
        let err = engine(&db)
            .submit(&[line(9999, 1, 100)], op, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_operator_is_invalid_request() {
        let (db, _) = test_db().await;
        let pid = common_product(&db, "Dipirona 500mg", 850).await;
        db.lots().insert(pid, "L", date(2026, 9, 1), 10).await.unwrap();

        let err = engine(&db)
            .submit(&[line(pid, 1, 850)], 424242, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::InvalidRequest(_)));
    }

    // -------------------------------------------------------------------------
    // Controlled-category gate
    // -------------------------------------------------------------------------

    async fn controlled_product(db: &Database) -> i64 {
        let pid = db
            .products()
            .create("Rivotril 2mg", "Roche", Category::Controlled, 4590, None)
            .await
            .unwrap();
        db.lots().insert(pid, "CTRL", date(2026, 9, 1), 15).await.unwrap();
        pid
    }

    #[tokio::test]
    async fn test_controlled_without_code_is_denied() {
        let (db, op) = test_db().await;
        let pid = controlled_product(&db).await;

        let err = engine(&db)
            .submit(&[line(pid, 1, 4590)], op, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::AuthorizationDenied));
    }

    #[tokio::test]
    async fn test_controlled_with_wrong_code_is_denied() {
        let (db, op) = test_db().await;
        let pid = controlled_product(&db).await;

        let err = engine(&db)
            .submit(&[line(pid, 1, 4590)], op, Some("wrong"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::AuthorizationDenied));
    }

    #[tokio::test]
    async fn test_controlled_with_code_but_no_prescription_is_invalid_request() {
        let (db, op) = test_db().await;
        let pid = controlled_product(&db).await;

        // The code was correct, so this must NOT be AuthorizationDenied
        let err = engine(&db)
            .submit(&[line(pid, 1, 4590)], op, Some(SUPERVISOR), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_controlled_full_gate_commits_and_records_release() {
        let (db, op) = test_db().await;
        let pid = controlled_product(&db).await;
        let proof = PrescriptionProof::new("receita.pdf");

        let sale_id = engine(&db)
            .submit(&[line(pid, 1, 4590)], op, Some(SUPERVISOR), Some(&proof))
            .await
            .unwrap();

        let sale = db.sales().get(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.supervisor_auth.as_deref(), Some(SUPERVISOR));
    }

    #[tokio::test]
    async fn test_mixed_cart_with_one_controlled_line_gates_whole_sale() {
        let (db, op) = test_db().await;
        let common = common_product(&db, "Dipirona 500mg", 850).await;
        db.lots().insert(common, "C", date(2026, 9, 1), 10).await.unwrap();
        let ctrl = controlled_product(&db).await;

        let cart = [line(common, 1, 850), line(ctrl, 1, 4590)];
        let err = engine(&db).submit(&cart, op, None, None).await.unwrap_err();
        assert!(matches!(err, SaleError::AuthorizationDenied));
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_concurrent_full_quantity_attempts_exactly_one_wins() {
        let (db, op) = test_db().await;
        let pid = common_product(&db, "Dipirona 500mg", 850).await;
        let lot_id = db
            .lots()
            .insert(pid, "RACE", date(2026, 9, 1), 5)
            .await
            .unwrap();

        let e1 = engine(&db);
        let e2 = engine(&db);

        // Both attempts want the lot's entire remaining quantity
        let cart = [line(pid, 5, 850)];
        let (r1, r2) = tokio::join!(
            e1.submit(&cart, op, None, None),
            e2.submit(&cart, op, None, None)
        );

        let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one attempt must win: {r1:?} / {r2:?}");

        let loser = if r1.is_ok() { r2 } else { r1 };
        assert!(matches!(
            loser.unwrap_err(),
            SaleError::InsufficientStock { .. }
        ));

        // The winner drained the lot; the loser wrote nothing
        assert_eq!(lot_qty(&db, lot_id).await, 0);
        assert_eq!(db.sales().recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sequential_sales_drain_lot_to_zero_never_negative() {
        let (db, op) = test_db().await;
        let pid = common_product(&db, "Dipirona 500mg", 850).await;
        let lot_id = db
            .lots()
            .insert(pid, "DRAIN", date(2026, 9, 1), 4)
            .await
            .unwrap();

        let eng = engine(&db);
        let cart = [line(pid, 2, 850)];

        eng.submit(&cart, op, None, None).await.unwrap();
        eng.submit(&cart, op, None, None).await.unwrap();
        assert_eq!(lot_qty(&db, lot_id).await, 0);

        let err = eng.submit(&cart, op, None, None).await.unwrap_err();
        assert!(matches!(err, SaleError::InsufficientStock { .. }));
        assert_eq!(lot_qty(&db, lot_id).await, 0);
    }

    #[tokio::test]
    async fn test_recent_sales_join_operator() {
        let (db, op) = test_db().await;
        let pid = common_product(&db, "Dipirona 500mg", 850).await;
        db.lots().insert(pid, "L", date(2026, 9, 1), 10).await.unwrap();

        engine(&db)
            .submit(&[line(pid, 1, 850)], op, None, None)
            .await
            .unwrap();

        let recent = db.sales().recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].operator_name, "Carlos Lima");
        assert_eq!(recent[0].operator_role, Role::Clerk);
        assert_eq!(recent[0].total_cents, 850);
    }
}
