//! # Receipt Emitter
//!
//! Delivers rendered receipt text to a sink, falling back to a text file
//! when the configured printer cannot be reached.
//!
//! ## Delivery Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Receipt Delivery                                     │
//! │                                                                         │
//! │  committed sale ──► ReceiptLayout::render ──► text                     │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                                  primary sink (usb | serial | file)    │
//! │                                        │               │                │
//! │                                      ok│          error│                │
//! │                                        ▼               ▼                │
//! │                          PrintOutcome { fell_back: false }              │
//! │                                                 FileSink (receipts/)   │
//! │                                                  │             │        │
//! │                                                ok│        error│        │
//! │                                                  ▼             ▼        │
//! │                          PrintOutcome { fell_back: true }   PrintError │
//! │                                                                         │
//! │  The sale is already committed when any of this runs. A PrintError     │
//! │  is reported to the cashier; it never undoes the sale.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Device sinks write ESC/POS bytes straight to the device node. Serial
//! line speed is configured on the port itself (stty / Device Manager).

use chrono::Local;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::settings::{PrinterSettings, SinkKind};

/// ESC @ : reset printer.
const ESC_INIT: &[u8] = &[0x1B, 0x40];
/// GS V 0 : full cut.
const GS_CUT: &[u8] = &[0x1D, 0x56, 0x00];
/// Blank lines fed before cutting so the last line clears the blade.
const FEED_BEFORE_CUT: usize = 4;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Printer {path} unavailable: {source}")]
    Device {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write receipt file in {dir}: {source}")]
    File {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No receipt to reprint")]
    NothingToReprint,
}

/// Where a receipt ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOutcome {
    /// Sink that accepted the receipt.
    pub sink: SinkKind,
    /// Device path or file written.
    pub location: String,
    /// True when the primary sink failed and the file sink took over.
    pub fell_back: bool,
    /// Why the primary sink failed, when it did.
    pub primary_error: Option<String>,
}

// =============================================================================
// Sinks
// =============================================================================

/// Somewhere receipt text can be sent.
pub trait ReceiptSink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Sends `text`; returns the location written.
    fn emit(&self, receipt_number: &str, text: &str) -> Result<String, PrintError>;
}

/// Raw ESC/POS write to a USB or serial device node.
#[derive(Debug, Clone)]
pub struct DeviceSink {
    kind: SinkKind,
    path: PathBuf,
}

impl DeviceSink {
    pub fn new(kind: SinkKind, path: impl Into<PathBuf>) -> Self {
        DeviceSink {
            kind,
            path: path.into(),
        }
    }

    fn escpos_bytes(text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(text.len() + 16);
        bytes.extend_from_slice(ESC_INIT);
        for line in text.lines() {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }
        bytes.extend(std::iter::repeat(b'\n').take(FEED_BEFORE_CUT));
        bytes.extend_from_slice(GS_CUT);
        bytes
    }
}

impl ReceiptSink for DeviceSink {
    fn kind(&self) -> SinkKind {
        self.kind
    }

    fn emit(&self, receipt_number: &str, text: &str) -> Result<String, PrintError> {
        let device_err = |source| PrintError::Device {
            path: self.path.display().to_string(),
            source,
        };

        // Never create: a missing device node means the printer is unplugged
        let mut device = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(device_err)?;

        device
            .write_all(&Self::escpos_bytes(text))
            .and_then(|_| device.flush())
            .map_err(device_err)?;

        debug!(receipt_number, path = %self.path.display(), "Receipt sent to printer");
        Ok(self.path.display().to_string())
    }
}

/// Text file per receipt in the receipts directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `receipt_<receipt_number>_<YYYYMMDD_HHMMSS>.txt`
    pub fn file_name(receipt_number: &str) -> String {
        format!(
            "receipt_{}_{}.txt",
            receipt_number,
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }
}

impl ReceiptSink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn emit(&self, receipt_number: &str, text: &str) -> Result<String, PrintError> {
        let file_err = |source| PrintError::File {
            dir: self.dir.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(file_err)?;
        let path = self.dir.join(Self::file_name(receipt_number));
        fs::write(&path, text).map_err(file_err)?;

        debug!(receipt_number, path = %path.display(), "Receipt written to file");
        Ok(path.display().to_string())
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// Primary sink plus the file fallback.
pub struct ReceiptEmitter {
    primary: Box<dyn ReceiptSink>,
    fallback: FileSink,
}

impl ReceiptEmitter {
    pub fn new(primary: Box<dyn ReceiptSink>, fallback: FileSink) -> Self {
        ReceiptEmitter { primary, fallback }
    }

    /// Builds the emitter the printer settings describe.
    pub fn from_settings(printer: &PrinterSettings, receipts_dir: &Path) -> Self {
        let fallback = FileSink::new(receipts_dir);
        let primary: Box<dyn ReceiptSink> = match printer.sink {
            SinkKind::Usb | SinkKind::Serial => {
                Box::new(DeviceSink::new(printer.sink, &printer.device_path))
            }
            SinkKind::File => Box::new(fallback.clone()),
        };
        ReceiptEmitter::new(primary, fallback)
    }

    pub fn primary_kind(&self) -> SinkKind {
        self.primary.kind()
    }

    /// Sends the receipt to the primary sink, or to the file sink if that
    /// fails.
    pub fn emit(&self, receipt_number: &str, text: &str) -> Result<PrintOutcome, PrintError> {
        let primary_error = match self.primary.emit(receipt_number, text) {
            Ok(location) => {
                info!(receipt_number, sink = %self.primary.kind(), "Receipt printed");
                return Ok(PrintOutcome {
                    sink: self.primary.kind(),
                    location,
                    fell_back: false,
                    primary_error: None,
                });
            }
            Err(e) if self.primary.kind() == SinkKind::File => return Err(e),
            Err(e) => e,
        };

        warn!(
            receipt_number,
            sink = %self.primary.kind(),
            error = %primary_error,
            "Printer failed, falling back to file"
        );

        let location = self.fallback.emit(receipt_number, text)?;
        Ok(PrintOutcome {
            sink: SinkKind::File,
            location,
            fell_back: true,
            primary_error: Some(primary_error.to_string()),
        })
    }
}
