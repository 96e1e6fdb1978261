//! # Sale Repository
//!
//! Read-side database operations for committed sales.
//!
//! Writes do not happen here: sales are only ever created by the
//! [`SaleEngine`](crate::engine::SaleEngine), atomically with their lines
//! and the stock decrements. This repository serves receipts and the
//! recent-sales listing.

use sqlx::SqlitePool;

use crate::error::DbResult;
use farma_core::{Sale, SaleLine, SaleSummary};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale: Option<Sale> = sqlx::query_as(
            r#"
            SELECT id, sold_at, total_cents, operator_id, supervisor_auth
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all lines of a sale, in insertion order.
    pub async fn lines(&self, sale_id: i64) -> DbResult<Vec<SaleLine>> {
        let lines: Vec<SaleLine> = sqlx::query_as(
            r#"
            SELECT id, sale_id, product_id, lot_id, quantity, unit_price_cents, subtotal_cents
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists the most recent sales joined with their operator, newest
    /// first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SaleSummary>> {
        let sales: Vec<SaleSummary> = sqlx::query_as(
            r#"
            SELECT
                s.id,
                s.sold_at,
                s.total_cents,
                o.name AS operator_name,
                o.role AS operator_role,
                s.supervisor_auth
            FROM sales s
            INNER JOIN operators o ON o.id = s.operator_id
            ORDER BY s.sold_at DESC, s.id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}
