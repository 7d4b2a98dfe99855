//! # Report Repository
//!
//! Read-only aggregate queries. These run on the pool without the checkout
//! lock; a sale committing concurrently is either fully counted or not at
//! all.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use till_core::report::{
    CashierSummary, DateRange, InventoryRow, ProductPerformance, SaleReportRow, SalesSummary,
};

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales in the range, newest first, with unit counts and cost at current
    /// cost prices.
    pub async fn sales_between(&self, range: DateRange) -> DbResult<Vec<SaleReportRow>> {
        debug!(start = %range.start, end = %range.end, "Sales report");

        let rows = sqlx::query_as::<_, SaleReportRow>(
            r#"
            SELECT
                s.id AS sale_id,
                s.receipt_number,
                s.created_at,
                s.cashier_name,
                COALESCE(SUM(si.quantity), 0) AS item_count,
                s.total_cents,
                COALESCE(SUM(si.quantity * p.cost_price_cents), 0) AS cost_cents
            FROM sales s
            LEFT JOIN sale_items si ON si.sale_id = s.id
            LEFT JOIN products p ON p.id = si.product_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY s.id
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Transaction count and sales total for the range.
    pub async fn sales_summary(&self, range: DateRange) -> DbResult<SalesSummary> {
        let rows = self.sales_between(range).await?;
        Ok(SalesSummary::from_rows(&rows))
    }

    /// Totals per cashier, biggest seller first.
    pub async fn cashier_summary(&self, range: DateRange) -> DbResult<Vec<CashierSummary>> {
        let rows = sqlx::query_as::<_, CashierSummary>(
            r#"
            SELECT
                cashier_id,
                MAX(cashier_name) AS cashier_name,
                COUNT(*) AS transaction_count,
                SUM(total_cents) AS total_sales_cents
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            GROUP BY cashier_id
            ORDER BY total_sales_cents DESC, cashier_name
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Units and revenue per product, best seller first.
    pub async fn product_performance(&self, range: DateRange) -> DbResult<Vec<ProductPerformance>> {
        let rows = sqlx::query_as::<_, ProductPerformance>(
            r#"
            SELECT
                si.product_id,
                MAX(si.name_snapshot) AS name,
                SUM(si.quantity) AS quantity_sold,
                SUM(si.line_total_cents) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY si.product_id
            ORDER BY quantity_sold DESC, revenue_cents DESC, si.product_id
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Current stock position of every product, lowest availability first.
    pub async fn inventory_snapshot(&self) -> DbResult<Vec<InventoryRow>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT
                id AS product_id,
                name,
                milliliters,
                quantity_stocked,
                quantity_sold,
                quantity_stocked - quantity_sold AS available,
                (quantity_stocked - quantity_sold) * cost_price_cents AS stock_value_cents,
                is_active
            FROM products
            ORDER BY available ASC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
