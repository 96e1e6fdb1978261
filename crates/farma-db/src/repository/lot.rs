//! # Lot Repository
//!
//! Database operations for stock lots.
//!
//! Lots are read in FEFO order everywhere: `ORDER BY expiry_date ASC,
//! id ASC`, matching the allocator's tie-break so a listing shows lots in
//! exactly the order they would be drawn down.
//!
//! The one mutation a lot ever sees after intake, the conditional stock
//! decrement, lives in the sale engine where it runs inside the sale
//! transaction.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use farma_core::{ExpiringLot, Lot};

/// Internal row type for the expiry alert join.
#[derive(Debug, sqlx::FromRow)]
struct ExpiringLotRow {
    lot_id: i64,
    product_name: String,
    manufacturer: String,
    lot_number: String,
    expiry_date: NaiveDate,
    quantity: i64,
}

/// Repository for lot database operations.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Lists all lots of a product in FEFO order (ascending expiry, then
    /// ascending id), including empty ones.
    pub async fn list_for_product(&self, product_id: i64) -> DbResult<Vec<Lot>> {
        let lots: Vec<Lot> = sqlx::query_as(
            r#"
            SELECT id, product_id, lot_number, expiry_date, quantity, created_at
            FROM lots
            WHERE product_id = ?1
            ORDER BY expiry_date ASC, id ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Gets a lot by its id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Lot>> {
        let lot: Option<Lot> = sqlx::query_as(
            r#"
            SELECT id, product_id, lot_number, expiry_date, quantity, created_at
            FROM lots
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Inserts a new lot and returns its id.
    ///
    /// Input validation (non-empty lot number, non-negative quantity)
    /// happens in [`Database::create_lot`](crate::Database::create_lot)
    /// before this runs; the schema's CHECK constraints back it up.
    pub async fn insert(
        &self,
        product_id: i64,
        lot_number: &str,
        expiry_date: NaiveDate,
        quantity: i64,
    ) -> DbResult<i64> {
        debug!(product_id, lot_number = %lot_number, quantity, "Inserting lot");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO lots (product_id, lot_number, expiry_date, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(product_id)
        .bind(lot_number)
        .bind(expiry_date)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Lists lots expiring inside `[today, today + window_days]`
    /// (inclusive) that still hold stock, joined with their product's
    /// identity and ordered by ascending expiry.
    ///
    /// Display-only: nothing here mutates.
    pub async fn expiring_within(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> DbResult<Vec<ExpiringLot>> {
        let window_end = today + Duration::days(window_days);

        debug!(%today, %window_end, "Scanning expiry alert window");

        let rows: Vec<ExpiringLotRow> = sqlx::query_as(
            r#"
            SELECT
                l.id AS lot_id,
                p.name AS product_name,
                p.manufacturer,
                l.lot_number,
                l.expiry_date,
                l.quantity
            FROM lots l
            INNER JOIN products p ON p.id = l.product_id
            WHERE l.expiry_date BETWEEN ?1 AND ?2
              AND l.quantity > 0
            ORDER BY l.expiry_date ASC, l.id ASC
            "#,
        )
        .bind(today)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ExpiringLot {
                lot_id: row.lot_id,
                product_name: row.product_name,
                manufacturer: row.manufacturer,
                lot_number: row.lot_number,
                expiry_date: row.expiry_date,
                quantity: row.quantity,
                days_to_expiry: (row.expiry_date - today).num_days(),
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
