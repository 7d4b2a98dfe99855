//! # Report Commands
//!
//! Read-only views over the ledger. All reports except `my_sales` are for
//! admins.
//!
//! Periods are resolved against the station's local clock, so "day" means
//! the shop's calendar day.

use chrono::Local;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{DbState, SessionState};
use till_core::report::{
    CashierSummary, DateRange, InventoryRow, ProductPerformance, ReportPeriod, SaleReportRow,
    SalesSummary,
};
use till_core::Sale;

/// Sales in a period plus their totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub range: DateRange,
    pub summary: SalesSummary,
    pub sales: Vec<SaleReportRow>,
}

fn resolve(period: ReportPeriod) -> ApiResult<DateRange> {
    Ok(period.resolve(Local::now().fixed_offset())?)
}

pub async fn sales_report(
    db: &DbState,
    session: &SessionState,
    period: ReportPeriod,
) -> ApiResult<SalesReport> {
    session.require_admin().await?;
    debug!(?period, "sales_report command");

    let range = resolve(period)?;
    let db = db.read().await;
    let sales = db.reports().sales_between(range).await?;
    Ok(SalesReport {
        range,
        summary: SalesSummary::from_rows(&sales),
        sales,
    })
}

pub async fn cashier_report(
    db: &DbState,
    session: &SessionState,
    period: ReportPeriod,
) -> ApiResult<Vec<CashierSummary>> {
    session.require_admin().await?;
    debug!(?period, "cashier_report command");

    let range = resolve(period)?;
    let db = db.read().await;
    Ok(db.reports().cashier_summary(range).await?)
}

pub async fn product_report(
    db: &DbState,
    session: &SessionState,
    period: ReportPeriod,
) -> ApiResult<Vec<ProductPerformance>> {
    session.require_admin().await?;
    debug!(?period, "product_report command");

    let range = resolve(period)?;
    let db = db.read().await;
    Ok(db.reports().product_performance(range).await?)
}

/// Current stock position of every product.
pub async fn inventory_report(
    db: &DbState,
    session: &SessionState,
) -> ApiResult<Vec<InventoryRow>> {
    session.require_admin().await?;
    debug!("inventory_report command");

    let db = db.read().await;
    Ok(db.reports().inventory_snapshot().await?)
}

/// The logged-in cashier's own sales.
pub async fn my_sales(
    db: &DbState,
    session: &SessionState,
    period: ReportPeriod,
) -> ApiResult<Vec<Sale>> {
    let session = session.current().await?;
    debug!(?period, "my_sales command");

    let range = resolve(period)?;
    let db = db.read().await;
    Ok(db.sales().list_for_cashier(&session.user_id, range).await?)
}
