//! # Sale Repository (Sale Transaction Manager)
//!
//! Commits carts as sales and reads them back.
//!
//! ## Commit Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(cashier_id, cart)                                          │
//! │                                                                         │
//! │  cart empty? ──────────────────────────────────► EmptyCart              │
//! │       │                                                                 │
//! │  lock checkout mutex                                                   │
//! │  BEGIN IMMEDIATE                                                        │
//! │       │                                                                 │
//! │  cashier active? ──────────────────────────────► UserNotFound           │
//! │       │                                                                 │
//! │  for each line, in cart order:                                         │
//! │     product active? ───────────────────────────► ProductNotFound        │
//! │     available >= qty? ─────────────────────────► InsufficientStock      │
//! │     snapshot name, ml, selling price                                   │
//! │       │                                                                 │
//! │  INSERT sales (receipt number, total)                                  │
//! │  for each line:                                                         │
//! │     INSERT sale_items                                                  │
//! │     reserve_and_deduct ────────────────────────► InsufficientStock      │
//! │       │                                                                 │
//! │  COMMIT ─────────────────────────────────────► SaleWithItems           │
//! │                                                                         │
//! │  Any error: ROLLBACK, nothing persisted. Storage errors surface as     │
//! │  TransactionFailed; domain errors keep their kind.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The price on the receipt is the price stored when the commit ran, not the
//! price shown when the line went into the cart.

use chrono::{DateTime, Local, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use till_core::report::DateRange;
use till_core::validation::validate_quantity;
use till_core::{Cart, CoreError, Money, Sale, SaleItem, SaleWithItems, ValidationError};

const SALE_COLUMNS: &str =
    "id, receipt_number, cashier_id, cashier_name, total_cents, created_at";

const ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, line_no, name_snapshot, milliliters_snapshot,
    quantity, unit_price_cents, line_total_cents
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    checkout_lock: Arc<Mutex<()>>,
}

/// A cart line after validation, with prices frozen.
struct PricedLine {
    product_id: String,
    name: String,
    milliliters: i64,
    quantity: i64,
    unit_price: Money,
    line_total: Money,
}

impl SaleRepository {
    /// Creates a new SaleRepository sharing the database's checkout lock.
    pub fn new(pool: SqlitePool, checkout_lock: Arc<Mutex<()>>) -> Self {
        SaleRepository {
            pool,
            checkout_lock,
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Commits a cart as one sale.
    ///
    /// ## Returns
    /// * `Ok(SaleWithItems)` - the persisted sale, items in cart order
    /// * `Err(Domain(EmptyCart))` - nothing to sell
    /// * `Err(Domain(UserNotFound))` - unknown or inactive cashier
    /// * `Err(Domain(ProductNotFound))` - unknown or inactive product
    /// * `Err(Domain(InsufficientStock))` - first line that cannot be filled
    /// * `Err(TransactionFailed)` - storage failure, rolled back
    ///
    /// A failed commit changes nothing, so resubmitting the same cart against
    /// the same stock fails the same way.
    pub async fn commit_sale(&self, cashier_id: &str, cart: &Cart) -> DbResult<SaleWithItems> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        debug!(cashier_id = %cashier_id, lines = cart.len(), "Committing sale");

        let _guard = self.checkout_lock.lock().await;

        // IMMEDIATE takes the write lock up front, so a write committed on
        // another connection makes this wait out busy_timeout instead of
        // failing the read-to-write upgrade.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::from(e).in_transaction())?;

        match Self::commit_in(&mut tx, cashier_id, cart).await {
            Ok(committed) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::from(e).in_transaction())?;

                info!(
                    sale_id = %committed.sale.id,
                    receipt_number = %committed.sale.receipt_number,
                    total_cents = committed.sale.total_cents,
                    lines = committed.items.len(),
                    "Sale committed"
                );
                Ok(committed)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                debug!(error = %err, "Sale rolled back");
                Err(err.in_transaction())
            }
        }
    }

    async fn commit_in(
        conn: &mut SqliteConnection,
        cashier_id: &str,
        cart: &Cart,
    ) -> DbResult<SaleWithItems> {
        // Cashier
        let cashier: Option<(String, bool)> =
            sqlx::query_as("SELECT full_name, is_active FROM users WHERE id = ?1")
                .bind(cashier_id)
                .fetch_optional(&mut *conn)
                .await?;

        let cashier_name = match cashier {
            Some((name, true)) => name,
            _ => return Err(CoreError::UserNotFound(cashier_id.to_string()).into()),
        };

        // Validate every line and freeze prices
        let mut priced = Vec::with_capacity(cart.len());
        for line in cart.lines() {
            validate_quantity(line.quantity)?;

            let product = match ProductRepository::fetch_in(conn, &line.product_id).await? {
                Some(p) if p.is_active => p,
                _ => return Err(CoreError::ProductNotFound(line.product_id.clone()).into()),
            };

            let available = product.available();
            if available < line.quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            let unit_price = product.selling_price();
            let line_total = unit_price
                .checked_multiply_quantity(line.quantity)
                .ok_or_else(|| overflow("line total"))?;

            priced.push(PricedLine {
                product_id: product.id,
                name: product.name,
                milliliters: product.milliliters,
                quantity: line.quantity,
                unit_price,
                line_total,
            });
        }

        let total = priced
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.line_total))
            .ok_or_else(|| overflow("total"))?;

        // Header
        let now = Utc::now();
        let receipt_number = Self::next_receipt_number(conn, now).await?;
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            receipt_number,
            cashier_id: cashier_id.to_string(),
            cashier_name,
            total_cents: total.minor(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (id, receipt_number, cashier_id, cashier_name, total_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(&sale.cashier_id)
        .bind(&sale.cashier_name)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        // Items + deductions
        let mut items = Vec::with_capacity(priced.len());
        for (idx, line) in priced.into_iter().enumerate() {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id,
                line_no: idx as i64 + 1,
                name_snapshot: line.name,
                milliliters_snapshot: line.milliliters,
                quantity: line.quantity,
                unit_price_cents: line.unit_price.minor(),
                line_total_cents: line.line_total.minor(),
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, line_no, name_snapshot, milliliters_snapshot,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.line_no)
            .bind(&item.name_snapshot)
            .bind(item.milliliters_snapshot)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .execute(&mut *conn)
            .await?;

            ProductRepository::reserve_and_deduct(conn, &item.product_id, item.quantity).await?;
            items.push(item);
        }

        Ok(SaleWithItems { sale, items })
    }

    /// Next `YYYYMMDD-NNNN` for the shop-local day of `now`.
    async fn next_receipt_number(
        conn: &mut SqliteConnection,
        now: DateTime<Utc>,
    ) -> DbResult<String> {
        let day = now.with_timezone(&Local).format("%Y%m%d").to_string();

        let last: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(CAST(substr(receipt_number, 10) AS INTEGER)), 0)
            FROM sales
            WHERE receipt_number LIKE ?1
            "#,
        )
        .bind(format!("{}-%", day))
        .fetch_one(&mut *conn)
        .await?;

        Ok(format!("{}-{:04}", day, last + 1))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn get_by_receipt_number(&self, receipt_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE receipt_number = ?1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(receipt_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Gets the items of a sale in cart order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Gets a sale with its items.
    pub async fn get_with_items(&self, sale_id: &str) -> DbResult<SaleWithItems> {
        let sale = self
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let items = self.get_items(sale_id).await?;
        Ok(SaleWithItems { sale, items })
    }

    /// Lists a cashier's sales in a date range, newest first.
    pub async fn list_for_cashier(&self, cashier_id: &str, range: DateRange) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE cashier_id = ?1 AND created_at >= ?2 AND created_at < ?3
            ORDER BY created_at DESC
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(cashier_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// Most recent sales, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales ORDER BY created_at DESC, receipt_number DESC LIMIT ?1",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn overflow(field: &str) -> DbError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::user::NewUser;
    use till_core::{NewProduct, Role};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .create(&NewUser {
                username: "jane".to_string(),
                full_name: "Jane Akello".to_string(),
                role: Role::Cashier,
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        db.products()
            .insert(&NewProduct {
                id: "P".to_string(),
                name: "Bell Lager".to_string(),
                description: None,
                milliliters: 500,
                cost_price_cents: 2000,
                selling_price_cents: 3000,
                quantity_stocked: 50,
            })
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_receipt_numbers_count_up_within_day() {
        let (db, cashier) = setup().await;
        let mut cart = Cart::new();
        cart.add("P", "Bell Lager", 500, 3000, 1).unwrap();

        let first = db.sales().commit_sale(&cashier, &cart).await.unwrap();
        let second = db.sales().commit_sale(&cashier, &cart).await.unwrap();

        let day = Local::now().format("%Y%m%d").to_string();
        assert_eq!(first.sale.receipt_number, format!("{}-0001", day));
        assert_eq!(second.sale.receipt_number, format!("{}-0002", day));
    }

    #[tokio::test]
    async fn test_committed_sale_reads_back() {
        let (db, cashier) = setup().await;
        let mut cart = Cart::new();
        cart.add("P", "Bell Lager", 500, 3000, 3).unwrap();

        let committed = db.sales().commit_sale(&cashier, &cart).await.unwrap();
        assert_eq!(committed.sale.cashier_name, "Jane Akello");
        assert_eq!(committed.items[0].line_total_cents, 9000);

        let loaded = db.sales().get_with_items(&committed.sale.id).await.unwrap();
        assert_eq!(loaded.items, committed.items);
        assert_eq!(loaded.sale.total_cents, 9000);
        assert_eq!(loaded.sale.receipt_number, committed.sale.receipt_number);

        let by_receipt = db
            .sales()
            .get_by_receipt_number(&committed.sale.receipt_number)
            .await
            .unwrap();
        assert_eq!(by_receipt.map(|s| s.id), Some(committed.sale.id.clone()));

        assert!(db.sales().get_with_items("missing").await.unwrap_err().is_not_found());
        assert_eq!(db.sales().recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_cashier_rejected() {
        let (db, cashier) = setup().await;
        db.users().set_active(&cashier, false).await.unwrap();

        let mut cart = Cart::new();
        cart.add("P", "Bell Lager", 500, 3000, 1).unwrap();

        let err = db.sales().commit_sale(&cashier, &cart).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UserNotFound(_))));
        assert_eq!(db.products().get_available("P").await.unwrap(), 50);
    }
}
