//! # Printer State
//!
//! Remembers the last receipt so an admin can reprint it, and routes every
//! print through a [`ReceiptEmitter`] built from the current settings.

use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::printer::{PrintError, PrintOutcome, ReceiptEmitter};
use crate::settings::Settings;
use till_core::SaleWithItems;

#[derive(Debug)]
pub struct PrinterState {
    receipts_dir: PathBuf,
    last: Mutex<Option<SaleWithItems>>,
}

impl PrinterState {
    pub fn new(receipts_dir: impl Into<PathBuf>) -> Self {
        PrinterState {
            receipts_dir: receipts_dir.into(),
            last: Mutex::new(None),
        }
    }

    /// Renders and emits the receipt for `sale`. The sale becomes the
    /// reprint candidate whether or not printing succeeds.
    pub async fn print(
        &self,
        settings: &Settings,
        sale: &SaleWithItems,
    ) -> Result<PrintOutcome, PrintError> {
        *self.last.lock().await = Some(sale.clone());
        self.emit(settings, sale)
    }

    /// Emits the last printed receipt again.
    pub async fn reprint_last(&self, settings: &Settings) -> Result<PrintOutcome, PrintError> {
        let last = self.last.lock().await.clone();
        match last {
            Some(sale) => self.emit(settings, &sale),
            None => Err(PrintError::NothingToReprint),
        }
    }

    pub async fn last_receipt_number(&self) -> Option<String> {
        self.last
            .lock()
            .await
            .as_ref()
            .map(|s| s.sale.receipt_number.clone())
    }

    fn emit(&self, settings: &Settings, sale: &SaleWithItems) -> Result<PrintOutcome, PrintError> {
        let text = settings.receipt_layout().render(sale);
        ReceiptEmitter::from_settings(&settings.printer, &self.receipts_dir)
            .emit(&sale.sale.receipt_number, &text)
    }
}
