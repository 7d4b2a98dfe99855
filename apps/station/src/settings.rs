//! # Station Settings
//!
//! Typed `settings.toml` living in the data directory. Loaded once at
//! startup, validated before use, rewritten by the admin settings command.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Settings Priority                                    │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_PRINTER_SINK=usb                                              │
//! │     TILL_PRINTER_DEVICE=/dev/usb/lp0                                   │
//! │     TILL_SHOP_NAME="Corner Wines & Spirits"                            │
//! │                                                                         │
//! │  2. settings.toml in the data directory                                │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     file sink, 48 columns, UGX with no decimals                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//! ```toml
//! [printer]
//! sink = "usb"             # usb | serial | file
//! device_path = "/dev/usb/lp0"
//! baud_rate = 9600
//! paper_width = 48
//!
//! [barcode]
//! scanner = "keyboard"
//! prefix = ""
//! suffix = "\n"
//!
//! [shop]
//! display_name = "Corner Wines & Spirits"
//! location = "Main Street"
//! contact = "0772 000000"
//! receipt_footer = "18+ Alcohol Warning: Not for sale to persons under 18."
//!
//! [currency]
//! symbol = "UGX"
//! decimals = 0
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use till_core::receipt::{ReceiptHeader, ReceiptLayout};
use till_core::CurrencyFormat;

/// Baud rates accepted for serial printers.
pub const STANDARD_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200,
];

/// Narrowest and widest paper rolls we lay receipts out for.
pub const PAPER_WIDTH_RANGE: std::ops::RangeInclusive<u16> = 32..=80;

/// Errors loading, validating or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

// =============================================================================
// Printer
// =============================================================================

/// Where receipts go first.
///
/// ```text
/// USB     raw write to a printer device node (/dev/usb/lp0, \\.\USB001)
/// SERIAL  raw write to a serial port device (/dev/ttyUSB0, COM1)
/// FILE    text file in <data_dir>/receipts
/// ```
///
/// Every non-file sink falls back to the file sink on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Usb,
    Serial,
    #[default]
    File,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Usb => "usb",
            SinkKind::Serial => "serial",
            SinkKind::File => "file",
        }
    }

    /// True for sinks that write to a device path.
    pub fn needs_device(&self) -> bool {
        matches!(self, SinkKind::Usb | SinkKind::Serial)
    }
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SinkKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usb" => Ok(SinkKind::Usb),
            "serial" => Ok(SinkKind::Serial),
            "file" => Ok(SinkKind::File),
            other => Err(SettingsError::Invalid(format!(
                "Unknown printer sink: '{}'. Valid options: usb, serial, file",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSettings {
    #[serde(default)]
    pub sink: SinkKind,

    /// Device node or port for usb/serial sinks.
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Characters per receipt line.
    #[serde(default = "default_paper_width")]
    pub paper_width: u16,
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_paper_width() -> u16 {
    48
}

impl Default for PrinterSettings {
    fn default() -> Self {
        PrinterSettings {
            sink: SinkKind::File,
            device_path: String::new(),
            baud_rate: default_baud_rate(),
            paper_width: default_paper_width(),
        }
    }
}

// =============================================================================
// Barcode
// =============================================================================

/// Barcode scanner input. Keyboard-wedge scanners type the code followed by
/// the configured suffix (usually Enter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeSettings {
    #[serde(default = "default_scanner")]
    pub scanner: String,

    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_scanner() -> String {
    "keyboard".to_string()
}

fn default_suffix() -> String {
    "\n".to_string()
}

impl Default for BarcodeSettings {
    fn default() -> Self {
        BarcodeSettings {
            scanner: default_scanner(),
            prefix: String::new(),
            suffix: default_suffix(),
        }
    }
}

impl BarcodeSettings {
    /// Turns raw scanner input into a product code.
    pub fn strip(&self, raw: &str) -> String {
        let mut code = raw;
        if !self.prefix.is_empty() {
            code = code.strip_prefix(self.prefix.as_str()).unwrap_or(code);
        }
        if !self.suffix.is_empty() {
            code = code.strip_suffix(self.suffix.as_str()).unwrap_or(code);
        }
        code.trim().to_string()
    }
}

// =============================================================================
// Shop & Currency
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    #[serde(default = "default_shop_name")]
    pub display_name: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub contact: String,

    #[serde(default = "default_receipt_footer")]
    pub receipt_footer: String,
}

fn default_shop_name() -> String {
    "Till POS".to_string()
}

fn default_receipt_footer() -> String {
    "18+ Alcohol Warning: Not for sale to persons under 18.".to_string()
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            display_name: default_shop_name(),
            location: String::new(),
            contact: String::new(),
            receipt_footer: default_receipt_footer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    #[serde(default)]
    pub decimals: u8,
}

fn default_currency_symbol() -> String {
    "UGX".to_string()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            symbol: default_currency_symbol(),
            decimals: 0,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// The whole settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub printer: PrinterSettings,

    #[serde(default)]
    pub barcode: BarcodeSettings,

    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub currency: CurrencySettings,
}

impl Settings {
    /// Loads `path`, applies environment overrides and validates.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let mut settings = Self::read_file(path)?;
        EnvOverrides::from_env().apply(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    /// The values written in `path`, without overrides or validation.
    pub fn read_file(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            info!(?path, "Loading settings");
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            debug!(?path, "Settings file not found, using defaults");
            Ok(Settings::default())
        }
    }

    /// File values for startup. Falls back to defaults when the file cannot
    /// be read, or when it is invalid once `overrides` are applied.
    pub fn stored_or_default(path: &Path, overrides: &EnvOverrides) -> Self {
        let stored = match Self::read_file(path) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to load settings: {}. Using defaults.", e);
                return Settings::default();
            }
        };

        let mut effective = stored.clone();
        overrides.apply(&mut effective);
        match effective.validate() {
            Ok(()) => stored,
            Err(e) => {
                warn!("Failed to load settings: {}. Using defaults.", e);
                Settings::default()
            }
        }
    }

    /// Validates and writes pretty TOML to `path`.
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        self.write(path)
    }

    /// Writes pretty TOML to `path` as is.
    pub(crate) fn write(&self, path: &Path) -> SettingsResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        info!(?path, "Settings saved");
        Ok(())
    }

    pub fn validate(&self) -> SettingsResult<()> {
        let printer = &self.printer;

        if printer.sink.needs_device() && printer.device_path.trim().is_empty() {
            return Err(SettingsError::Invalid(format!(
                "printer.device_path is required for the {} sink",
                printer.sink
            )));
        }

        if printer.sink == SinkKind::Serial && !STANDARD_BAUD_RATES.contains(&printer.baud_rate) {
            return Err(SettingsError::Invalid(format!(
                "printer.baud_rate {} is not a standard rate ({:?})",
                printer.baud_rate, STANDARD_BAUD_RATES
            )));
        }

        if !PAPER_WIDTH_RANGE.contains(&printer.paper_width) {
            return Err(SettingsError::Invalid(format!(
                "printer.paper_width must be between {} and {}",
                PAPER_WIDTH_RANGE.start(),
                PAPER_WIDTH_RANGE.end()
            )));
        }

        if self.shop.display_name.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "shop.display_name is required".into(),
            ));
        }

        if self.currency.decimals > 4 {
            return Err(SettingsError::Invalid(
                "currency.decimals must be at most 4".into(),
            ));
        }

        Ok(())
    }

    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat::new(self.currency.symbol.clone(), self.currency.decimals)
    }

    /// Receipt layout for the current shop, currency and paper, printing
    /// times in the machine's local offset.
    pub fn receipt_layout(&self) -> ReceiptLayout {
        let header = ReceiptHeader {
            display_name: self.shop.display_name.clone(),
            location: self.shop.location.clone(),
            contact: self.shop.contact.clone(),
            footer: self.shop.receipt_footer.clone(),
        };
        ReceiptLayout::new(
            header,
            self.currency_format(),
            self.printer.paper_width as usize,
        )
        .with_utc_offset(*Local::now().offset())
    }
}

/// `<data_dir>/settings.toml`
pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.toml")
}

// =============================================================================
// Environment Overrides
// =============================================================================

/// `TILL_*` values that win over the file for this process only.
///
/// They are applied on every read and kept out of `settings.toml`: saving
/// settings that still carry an override value writes the file's own value
/// for that field instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub printer_sink: Option<SinkKind>,
    pub printer_device: Option<String>,
    pub shop_name: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let printer_sink = lookup("TILL_PRINTER_SINK").and_then(|sink| match sink.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(sink = %sink, "Unknown printer sink in environment");
                None
            }
        });

        EnvOverrides {
            printer_sink,
            printer_device: lookup("TILL_PRINTER_DEVICE"),
            shop_name: lookup("TILL_SHOP_NAME"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.printer_sink.is_none() && self.printer_device.is_none() && self.shop_name.is_none()
    }

    pub fn apply(&self, settings: &mut Settings) {
        if let Some(sink) = self.printer_sink {
            debug!(sink = %sink, "Overriding printer sink from environment");
            settings.printer.sink = sink;
        }
        if let Some(device) = &self.printer_device {
            debug!(device = %device, "Overriding printer device from environment");
            settings.printer.device_path = device.clone();
        }
        if let Some(name) = &self.shop_name {
            settings.shop.display_name = name.clone();
        }
    }

    /// Puts `stored` values back into `edited` wherever `edited` still holds
    /// the override value. Fields the admin actually changed are kept.
    pub fn unapply(&self, edited: &mut Settings, stored: &Settings) {
        if self.printer_sink == Some(edited.printer.sink) {
            edited.printer.sink = stored.printer.sink;
        }
        if self.printer_device.as_deref() == Some(edited.printer.device_path.as_str()) {
            edited.printer.device_path = stored.printer.device_path.clone();
        }
        if self.shop_name.as_deref() == Some(edited.shop.display_name.as_str()) {
            edited.shop.display_name = stored.shop.display_name.clone();
        }
    }
}
