//! # Receipt Text
//!
//! Renders a committed sale as plain monospaced text. The station's printer
//! module decides where the text goes; this module only lays it out.
//!
//! ## Layout
//! ```text
//! ================================================
//!   Corner Wines & Spirits
//!   Location: Main Street
//!   Contact: 0772 000000
//! ================================================
//! Date: 2026-03-14 18:22:05
//! Cashier: Jane Akello
//! Receipt #: 20260314-0007
//! ------------------------------------------------
//! Item             MLs   Qty      Price      Total
//! ------------------------------------------------
//! Nile Special    500ml     2  UGX 3,500  UGX 7,000
//! ------------------------------------------------
//! GRAND TOTAL:                           UGX 7,000
//! ================================================
//!
//! 18+ Alcohol Warning: Not for sale to persons under 18.
//!
//! Thank you for your purchase!
//! ================================================
//! ```

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{CurrencyFormat, Money};
use crate::types::SaleWithItems;

const ML_WIDTH: usize = 6;
const QTY_WIDTH: usize = 5;
const AMOUNT_WIDTH: usize = 10;
const MIN_NAME_WIDTH: usize = 8;

/// Shop identity printed at the top and bottom of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReceiptHeader {
    pub display_name: String,
    pub location: String,
    pub contact: String,
    /// Legal notice printed under the total (e.g. age warning). May be empty.
    pub footer: String,
}

/// Everything needed to turn a sale into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLayout {
    pub header: ReceiptHeader,
    pub currency: CurrencyFormat,
    /// Characters per line of the paper roll.
    pub width: usize,
    /// Offset used to print the sale time in shop-local time.
    pub utc_offset: FixedOffset,
}

impl ReceiptLayout {
    pub fn new(header: ReceiptHeader, currency: CurrencyFormat, width: usize) -> Self {
        ReceiptLayout {
            header,
            currency,
            width,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    fn name_width(&self) -> usize {
        self.width
            .saturating_sub(ML_WIDTH + QTY_WIDTH + 2 * AMOUNT_WIDTH + 4)
            .max(MIN_NAME_WIDTH)
    }

    fn money(&self, minor: i64) -> String {
        self.currency.format(Money::from_minor(minor))
    }

    /// Renders the receipt.
    pub fn render(&self, sale: &SaleWithItems) -> String {
        let heavy = "=".repeat(self.width);
        let light = "-".repeat(self.width);
        let name_w = self.name_width();
        let mut out: Vec<String> = Vec::with_capacity(20 + sale.items.len());

        out.push(heavy.clone());
        out.push(format!("  {}", self.header.display_name));
        if !self.header.location.is_empty() {
            out.push(format!("  Location: {}", self.header.location));
        }
        if !self.header.contact.is_empty() {
            out.push(format!("  Contact: {}", self.header.contact));
        }
        out.push(heavy.clone());

        let local = sale.sale.created_at.with_timezone(&self.utc_offset);
        out.push(format!("Date: {}", local.format("%Y-%m-%d %H:%M:%S")));
        out.push(format!("Cashier: {}", sale.sale.cashier_name));
        out.push(format!("Receipt #: {}", sale.sale.receipt_number));
        out.push(light.clone());
        out.push(format!(
            "{:<name_w$} {:>ml_w$} {:>qty_w$} {:>amt_w$} {:>amt_w$}",
            "Item",
            "MLs",
            "Qty",
            "Price",
            "Total",
            name_w = name_w,
            ml_w = ML_WIDTH,
            qty_w = QTY_WIDTH,
            amt_w = AMOUNT_WIDTH,
        ));
        out.push(light.clone());

        for item in &sale.items {
            let name: String = item.name_snapshot.chars().take(name_w).collect();
            let ml = if item.milliliters_snapshot > 0 {
                format!("{}ml", item.milliliters_snapshot)
            } else {
                "-".to_string()
            };
            out.push(format!(
                "{:<name_w$} {:>ml_w$} {:>qty_w$} {:>amt_w$} {:>amt_w$}",
                name,
                ml,
                item.quantity,
                self.money(item.unit_price_cents),
                self.money(item.line_total_cents),
                name_w = name_w,
                ml_w = ML_WIDTH,
                qty_w = QTY_WIDTH,
                amt_w = AMOUNT_WIDTH,
            ));
        }

        out.push(light);
        let total = self.money(sale.sale.total_cents);
        let label_w = self.width.saturating_sub(total.chars().count() + 1);
        out.push(format!("{:<label_w$} {}", "GRAND TOTAL:", total, label_w = label_w));
        out.push(heavy.clone());
        out.push(String::new());
        if !self.header.footer.is_empty() {
            out.push(self.header.footer.clone());
            out.push(String::new());
        }
        out.push("Thank you for your purchase!".to_string());
        out.push(heavy);

        out.join("\n")
    }
}
