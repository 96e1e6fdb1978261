//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Stock Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │             How the catalog listing is assembled                │
//! │                                                                 │
//! │  products p  LEFT JOIN  lots l (quantity > 0)                   │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  GROUP BY product:                                              │
//! │    stock_total    = SUM(l.quantity)  (0 when no stocked lot)    │
//! │    nearest_expiry = MIN(l.expiry_date)                          │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  pricing::quote(list price, nearest_expiry, today)              │
//! │    → sale price, original price, discount flag                  │
//! │                                                                 │
//! │  The price is recomputed on every read and never persisted.     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use farma_core::{pricing, Category, Money, Product, ProductSummary};

/// Internal row type for the catalog listing query.
#[derive(Debug, sqlx::FromRow)]
struct ProductStockRow {
    id: i64,
    name: String,
    manufacturer: String,
    category: Category,
    price_cents: i64,
    description: Option<String>,
    stock_total: i64,
    nearest_expiry: Option<NaiveDate>,
}

impl ProductStockRow {
    fn into_summary(self, today: NaiveDate) -> ProductSummary {
        let quote = pricing::quote(Money::from_cents(self.price_cents), self.nearest_expiry, today);
        ProductSummary {
            id: self.id,
            name: self.name,
            manufacturer: self.manufacturer,
            category: self.category,
            description: self.description,
            stock_total: self.stock_total,
            nearest_expiry: self.nearest_expiry,
            quote,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let catalog = repo.list_with_stock(today).await?;
/// let product = repo.get(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product with aggregated stock, nearest upcoming expiry
    /// among its positive-quantity lots, and the display price quoted
    /// against `today`. Ordered by product name.
    pub async fn list_with_stock(&self, today: NaiveDate) -> DbResult<Vec<ProductSummary>> {
        debug!("Listing catalog with stock aggregation");

        let rows: Vec<ProductStockRow> = sqlx::query_as(
            r#"
            SELECT
                p.id,
                p.name,
                p.manufacturer,
                p.category,
                p.price_cents,
                p.description,
                COALESCE(SUM(l.quantity), 0) AS stock_total,
                MIN(l.expiry_date) AS nearest_expiry
            FROM products p
            LEFT JOIN lots l ON l.product_id = p.id AND l.quantity > 0
            GROUP BY p.id, p.name, p.manufacturer, p.category, p.price_cents, p.description
            ORDER BY p.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Catalog listing returned products");

        Ok(rows.into_iter().map(|row| row.into_summary(today)).collect())
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - product found
    /// * `Ok(None)` - product not found
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let product: Option<Product> = sqlx::query_as(
            r#"
            SELECT id, name, manufacturer, category, price_cents, description, created_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product and returns its id.
    pub async fn create(
        &self,
        name: &str,
        manufacturer: &str,
        category: Category,
        price_cents: i64,
        description: Option<&str>,
    ) -> DbResult<i64> {
        debug!(name = %name, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, manufacturer, category, price_cents, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(name)
        .bind(manufacturer)
        .bind(category)
        .bind(price_cents)
        .bind(description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates an existing product's editable fields.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, manufacturer = ?3, category = ?4,
                price_cents = ?5, description = ?6
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.manufacturer)
        .bind(product.category)
        .bind(product.price_cents)
        .bind(&product.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Deletes a product. Its lots go with it (ON DELETE CASCADE); sale
    /// history rows keep their product_id reference, so deletion fails for
    /// products that were ever sold.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog products (used by the seed binary's idempotence
    /// check).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;

        let id = db
            .products()
            .create("Dipirona 500mg", "EMS", Category::Common, 850, Some("Analgesic"))
            .await
            .unwrap();

        let product = db.products().get(id).await.unwrap().unwrap();
        assert_eq!(product.name, "Dipirona 500mg");
        assert_eq!(product.category, Category::Common);
        assert_eq!(product.price_cents, 850);

        assert!(db.products().get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stock_total_is_sum_of_lots() {
        let db = test_db().await;
        let today = date(2026, 3, 1);

        let id = db
            .products()
            .create("Paracetamol 750mg", "Medley", Category::Common, 690, None)
            .await
            .unwrap();

        db.lots()
            .insert(id, "LOT001", date(2026, 9, 1), 100)
            .await
            .unwrap();
        db.lots()
            .insert(id, "LOT002", date(2026, 6, 1), 50)
            .await
            .unwrap();
        // Empty lots must not drag the nearest expiry forward
        db.lots()
            .insert(id, "LOT003", date(2026, 4, 1), 0)
            .await
            .unwrap();

        let catalog = db.products().list_with_stock(today).await.unwrap();
        assert_eq!(catalog.len(), 1);

        let summary = &catalog[0];
        assert_eq!(summary.stock_total, 150);
        assert_eq!(summary.nearest_expiry, Some(date(2026, 6, 1)));
        assert!(!summary.quote.discounted);
    }

    #[tokio::test]
    async fn test_listing_quotes_discount_from_nearest_expiry() {
        let db = test_db().await;
        let today = date(2026, 3, 1);

        let id = db
            .products()
            .create("Ibuprofeno 400mg", "Neo Quimica", Category::Common, 1200, None)
            .await
            .unwrap();

        // 25 days out: inside the discount window
        db.lots()
            .insert(id, "LOT010", date(2026, 3, 26), 10)
            .await
            .unwrap();

        let catalog = db.products().list_with_stock(today).await.unwrap();
        let summary = &catalog[0];
        assert!(summary.quote.discounted);
        assert_eq!(summary.quote.sale_price.cents(), 960);
        assert_eq!(summary.quote.list_price.cents(), 1200);
    }

    #[tokio::test]
    async fn test_out_of_stock_product_lists_with_zero_stock() {
        let db = test_db().await;

        db.products()
            .create("Rivotril 2mg", "Roche", Category::Controlled, 4590, None)
            .await
            .unwrap();

        let catalog = db.products().list_with_stock(date(2026, 3, 1)).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].stock_total, 0);
        assert_eq!(catalog[0].nearest_expiry, None);
        assert!(!catalog[0].quote.discounted);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;

        let id = db
            .products()
            .create("Shampoo", "H&S", Category::Hygiene, 2250, None)
            .await
            .unwrap();

        let mut product = db.products().get(id).await.unwrap().unwrap();
        product.price_cents = 1990;
        db.products().update(&product).await.unwrap();

        let updated = db.products().get(id).await.unwrap().unwrap();
        assert_eq!(updated.price_cents, 1990);

        db.products().delete(id).await.unwrap();
        assert!(db.products().get(id).await.unwrap().is_none());

        let err = db.products().delete(id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
