//! # Report Types
//!
//! Period resolution and row types for the read-only sales reports.
//!
//! ## Period Resolution
//! ```text
//! now (shop-local)  = Wed 2026-03-18 14:05
//!
//!   Day    → [2026-03-18 00:00, 2026-03-19 00:00)
//!   Week   → [2026-03-16 00:00, 2026-03-19 00:00)   weeks start Monday
//!   Month  → [2026-03-01 00:00, 2026-03-19 00:00)
//!   Year   → [2026-01-01 00:00, 2026-03-19 00:00)
//!   Custom → [start 00:00, end+1 00:00)              both dates inclusive
//! ```
//! Ranges are half-open and converted to UTC, which is how timestamps are
//! stored.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Periods
// =============================================================================

/// The period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export)]
pub enum ReportPeriod {
    Day,
    Week,
    Month,
    Year,
    Custom {
        #[ts(as = "String")]
        start: NaiveDate,
        #[ts(as = "String")]
        end: NaiveDate,
    },
}

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

impl ReportPeriod {
    /// Resolves the period against the shop-local current time.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{FixedOffset, TimeZone};
    /// use till_core::report::ReportPeriod;
    ///
    /// let eat = FixedOffset::east_opt(3 * 3600).unwrap();
    /// let now = eat.with_ymd_and_hms(2026, 3, 18, 14, 5, 0).unwrap();
    /// let range = ReportPeriod::Day.resolve(now).unwrap();
    ///
    /// assert_eq!(range.start.to_rfc3339(), "2026-03-17T21:00:00+00:00");
    /// assert_eq!(range.end.to_rfc3339(), "2026-03-18T21:00:00+00:00");
    /// ```
    pub fn resolve(&self, now: DateTime<FixedOffset>) -> ValidationResult<DateRange> {
        let offset = *now.offset();
        let today = now.date_naive();
        let tomorrow = today + Duration::days(1);

        let (first_day, end_day) = match *self {
            ReportPeriod::Day => (today, tomorrow),
            ReportPeriod::Week => {
                let back = today.weekday().num_days_from_monday() as i64;
                (today - Duration::days(back), tomorrow)
            }
            ReportPeriod::Month => (
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today),
                tomorrow,
            ),
            ReportPeriod::Year => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                tomorrow,
            ),
            ReportPeriod::Custom { start, end } => {
                if end < start {
                    return Err(ValidationError::Mismatch(
                        "Report end date is before start date".to_string(),
                    ));
                }
                (start, end + Duration::days(1))
            }
        };

        Ok(DateRange {
            start: local_midnight_utc(first_day, offset),
            end: local_midnight_utc(end_day, offset),
        })
    }
}

fn local_midnight_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    (local - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
}

// =============================================================================
// Report Rows
// =============================================================================

/// One sale in the sales report.
///
/// Cost uses the product's current cost price, so profit on old sales moves
/// when a cost price is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReportRow {
    pub sale_id: String,
    pub receipt_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub cashier_name: String,
    /// Units sold across all lines.
    pub item_count: i64,
    pub total_cents: i64,
    pub cost_cents: i64,
}

impl SaleReportRow {
    pub fn profit(&self) -> Money {
        Money::from_minor(self.total_cents - self.cost_cents)
    }
}

/// Totals over a set of sale rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub transactions: i64,
    pub total_sales_cents: i64,
    pub total_cost_cents: i64,
    pub total_profit_cents: i64,
}

impl SalesSummary {
    pub fn from_rows(rows: &[SaleReportRow]) -> Self {
        rows.iter().fold(SalesSummary::default(), |mut acc, row| {
            acc.transactions += 1;
            acc.total_sales_cents += row.total_cents;
            acc.total_cost_cents += row.cost_cents;
            acc.total_profit_cents += row.profit().minor();
            acc
        })
    }
}

/// Per-cashier totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashierSummary {
    pub cashier_id: String,
    pub cashier_name: String,
    pub transaction_count: i64,
    pub total_sales_cents: i64,
}

/// Per-product totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductPerformance {
    pub product_id: String,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// Stock position of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryRow {
    pub product_id: String,
    pub name: String,
    pub milliliters: i64,
    pub quantity_stocked: i64,
    pub quantity_sold: i64,
    pub available: i64,
    /// available × cost price
    pub stock_value_cents: i64,
    pub is_active: bool,
}
