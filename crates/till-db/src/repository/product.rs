//! # Product Repository (Inventory Ledger)
//!
//! Stock counters and product maintenance.
//!
//! ## Ledger Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Cumulative Counters                              │
//! │                                                                         │
//! │  quantity_stocked  ── grows on restock ──────────────►                 │
//! │  quantity_sold     ── grows on committed sale lines ─►                 │
//! │                                                                         │
//! │  available = stocked − sold        (never negative)                    │
//! │                                                                         │
//! │  Deduction is one conditional statement:                               │
//! │    UPDATE products SET quantity_sold = quantity_sold + :qty            │
//! │     WHERE id = :id AND quantity_stocked − quantity_sold >= :qty        │
//! │                                                                         │
//! │  0 rows touched → unknown product or not enough stock.                 │
//! │  The table CHECK (sold <= stocked) backs this up.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deduction is only reachable from inside the sale commit transaction; see
//! [`crate::repository::sale`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use till_core::validation::{
    validate_new_product, validate_product_code, validate_product_update,
    validate_restock_quantity, validate_search_query,
};
use till_core::{CoreError, NewProduct, Product, ProductUpdate, ValidationError};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, milliliters,
    cost_price_cents, selling_price_cents,
    quantity_stocked, quantity_sold,
    is_active, created_at, updated_at
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its code, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets a product that can currently be sold.
    ///
    /// ## Returns
    /// * `Err(ProductNotFound)` - unknown code or deactivated product
    pub async fn get_sellable(&self, id: &str) -> DbResult<Product> {
        match self.get_by_id(id).await? {
            Some(p) if p.is_active => Ok(p),
            _ => Err(CoreError::ProductNotFound(id.trim().to_string()).into()),
        }
    }

    /// Units available for sale (`stocked − sold`).
    pub async fn get_available(&self, id: &str) -> DbResult<i64> {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT quantity_stocked - quantity_sold FROM products WHERE id = ?1",
        )
        .bind(id.trim())
        .fetch_optional(&self.pool)
        .await?;

        available.ok_or_else(|| CoreError::ProductNotFound(id.trim().to_string()).into())
    }

    /// Lists products ordered by name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Product>> {
        let sql = if include_inactive {
            format!("SELECT {} FROM products ORDER BY name, id", PRODUCT_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM products WHERE is_active = 1 ORDER BY name, id",
                PRODUCT_COLUMNS
            )
        };
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Searches active products by code or name.
    ///
    /// ## Arguments
    /// * `query` - Substring of the code or name; empty lists everything
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, limit = %limit, "Searching products");

        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE is_active = 1
              AND (?1 = '' OR id LIKE ?2 OR name LIKE ?2)
            ORDER BY name, id
            LIMIT ?3
            "#,
            PRODUCT_COLUMNS
        );
        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&query)
            .bind(&pattern)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Inserts a new product with `quantity_sold = 0`.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the code already exists
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;
        let id = new.id.trim().to_string();
        debug!(id = %id, "Inserting product");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, milliliters,
                cost_price_cents, selling_price_cents,
                quantity_stocked, quantity_sold,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 1, ?8, ?8)
            "#,
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(new.description.as_deref().map(str::trim))
        .bind(new.milliliters)
        .bind(new.cost_price_cents)
        .bind(new.selling_price_cents)
        .bind(new.quantity_stocked)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("product code", &id),
            other => other,
        })?;

        info!(id = %id, stocked = new.quantity_stocked, "Product created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &id))
    }

    /// Updates the editable fields of a product.
    ///
    /// `quantity_stocked` may not drop below what has already been sold.
    pub async fn update(&self, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update)?;
        let id = update.id.trim();
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                milliliters = ?4,
                cost_price_cents = ?5,
                selling_price_cents = ?6,
                quantity_stocked = ?7,
                updated_at = ?8
            WHERE id = ?1 AND ?7 >= quantity_sold
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.milliliters)
        .bind(update.cost_price_cents)
        .bind(update.selling_price_cents)
        .bind(update.quantity_stocked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing = self.get_by_id(id).await?;
            return Err(match existing {
                None => CoreError::ProductNotFound(id.to_string()).into(),
                Some(p) => ValidationError::Mismatch(format!(
                    "Quantity stocked cannot be below quantity already sold ({})",
                    p.quantity_sold
                ))
                .into(),
            });
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Receives a delivery: `quantity_stocked += quantity`.
    ///
    /// ## Returns
    /// The product after the restock.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<Product> {
        validate_restock_quantity(quantity)?;
        let id = id.trim();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_stocked = quantity_stocked + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        info!(id = %id, quantity, "Product restocked");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product. Sale history keeps referencing it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        self.set_active(id, false).await
    }

    pub async fn reactivate(&self, id: &str) -> DbResult<()> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        validate_product_code(id)?;
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.trim())
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.trim().to_string()).into());
        }
        Ok(())
    }

    // =========================================================================
    // Transaction-scoped ledger operations
    // =========================================================================

    /// Reads a product on the commit transaction's connection.
    pub(crate) async fn fetch_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(product)
    }

    /// Increments `quantity_sold` if enough stock is available.
    ///
    /// ## Arguments
    /// * `conn` - the open commit transaction
    ///
    /// ## Returns
    /// * `Ok(available)` - units left after the deduction
    /// * `Err(InsufficientStock)` - nothing was changed
    /// * `Err(ProductNotFound)` - unknown code
    pub(crate) async fn reserve_and_deduct(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<i64> {
        if quantity <= 0 {
            return Err(ValidationError::must_be_positive("quantity").into());
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_sold = quantity_sold + ?2,
                updated_at = ?3
            WHERE id = ?1
              AND quantity_stocked - quantity_sold >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        let available: Option<i64> = sqlx::query_scalar(
            "SELECT quantity_stocked - quantity_sold FROM products WHERE id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(available) = available else {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        };

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
                requested: quantity,
            }
            .into());
        }

        debug!(product_id = %product_id, quantity, available, "Stock deducted");
        Ok(available)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn nile(stocked: i64) -> NewProduct {
        NewProduct {
            id: "6001234567890".to_string(),
            name: "Nile Special".to_string(),
            description: Some("Lager".to_string()),
            milliliters: 500,
            cost_price_cents: 2500,
            selling_price_cents: 3500,
            quantity_stocked: stocked,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&nile(10)).await.unwrap();
        assert_eq!(p.quantity_sold, 0);
        assert_eq!(p.available(), 10);
        assert_eq!(repo.get_available("6001234567890").await.unwrap(), 10);

        let dup = repo.insert(&nile(5)).await.unwrap_err();
        assert!(matches!(dup, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_get_available_unknown() {
        let db = db().await;
        let err = db.products().get_available("NOPE").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_restock() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&nile(10)).await.unwrap();

        let p = repo.restock("6001234567890", 24).await.unwrap();
        assert_eq!(p.quantity_stocked, 34);

        assert!(matches!(
            repo.restock("6001234567890", 0).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
        assert!(repo.restock("NOPE", 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_reserve_and_deduct() {
        let db = db().await;
        db.products().insert(&nile(10)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let left = ProductRepository::reserve_and_deduct(&mut conn, "6001234567890", 4)
            .await
            .unwrap();
        assert_eq!(left, 6);

        let err = ProductRepository::reserve_and_deduct(&mut conn, "6001234567890", 7)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 6,
                requested: 7,
                ..
            })
        ));

        let err = ProductRepository::reserve_and_deduct(&mut conn, "NOPE", 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        drop(conn);

        assert_eq!(db.products().get_available("6001234567890").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_update_cannot_drop_below_sold() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&nile(10)).await.unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            ProductRepository::reserve_and_deduct(&mut conn, "6001234567890", 8)
                .await
                .unwrap();
        }

        let mut update = ProductUpdate::from(&repo.get_by_id("6001234567890").await.unwrap().unwrap());
        update.quantity_stocked = 5;
        assert!(matches!(
            repo.update(&update).await,
            Err(DbError::Domain(CoreError::Validation(ValidationError::Mismatch(_))))
        ));

        update.quantity_stocked = 12;
        update.selling_price_cents = 4000;
        let p = repo.update(&update).await.unwrap();
        assert_eq!(p.available(), 4);
        assert_eq!(p.selling_price_cents, 4000);
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_search() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&nile(10)).await.unwrap();

        assert_eq!(repo.search("nile", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("", 10).await.unwrap().len(), 1);

        repo.deactivate("6001234567890").await.unwrap();
        assert!(repo.search("nile", 10).await.unwrap().is_empty());
        assert!(repo.get_sellable("6001234567890").await.unwrap_err().is_not_found());
        assert_eq!(repo.list(true).await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.reactivate("6001234567890").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
