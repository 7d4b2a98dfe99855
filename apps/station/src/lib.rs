//! # Till Station Library
//!
//! Application layer of Till POS: the typed command surface a till UI calls,
//! plus receipt printing, settings, authentication and backups.
//!
//! ## Module Organization
//! ```text
//! till_station/
//! ├── lib.rs          ◄─── You are here (data dir, logging, Station)
//! ├── state/          ◄─── Db, cart, session, settings, printer state
//! ├── commands/       ◄─── auth, product, cart, sale, user, report,
//! │                        backup, settings
//! ├── auth.rs         ◄─── argon2 hashing, login, default admin
//! ├── backup.rs       ◄─── backup files, restore swap
//! ├── printer.rs      ◄─── receipt sinks and file fallback
//! ├── settings.rs     ◄─── settings.toml
//! └── error.rs        ◄─── ApiError for commands
//! ```
//!
//! ## Data Directory
//! ```text
//! <data_dir>/
//! ├── till.db          SQLite database (+ -wal / -shm)
//! ├── settings.toml    printer, barcode, shop, currency
//! ├── receipts/        file-sink receipts
//! └── backups/         till_backup_*.db, pre_restore_*.db
//! ```

pub mod auth;
pub mod backup;
pub mod commands;
pub mod error;
pub mod printer;
pub mod settings;
pub mod state;

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::{ApiError, ApiResult};
use settings::{EnvOverrides, Settings};
use state::{CartState, DbState, PrinterState, SessionState, SettingsState};
use till_db::{Database, DbConfig};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till=trace` - Show trace for till crates only
/// - Default: `info,till=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// =============================================================================
// Data Directory
// =============================================================================

/// Where the station keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataDir { root: root.into() }
    }

    /// Platform data directory, or `TILL_DATA_DIR` when set.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.till.pos`
    /// - **Windows**: `%APPDATA%\till\pos\data`
    /// - **Linux**: `~/.local/share/pos`
    pub fn resolve() -> ApiResult<Self> {
        if let Ok(path) = std::env::var("TILL_DATA_DIR") {
            return Ok(DataDir::new(path));
        }

        ProjectDirs::from("com", "till", "pos")
            .map(|dirs| DataDir::new(dirs.data_dir()))
            .ok_or_else(|| ApiError::internal("Could not determine app data directory"))
    }

    /// Creates the directory tree if missing.
    pub fn ensure(&self) -> ApiResult<()> {
        for dir in [self.root.clone(), self.receipts_dir(), self.backups_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                ApiError::internal(format!("Cannot create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("till.db")
    }

    pub fn settings_path(&self) -> PathBuf {
        settings::settings_path(&self.root)
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.root.join("receipts")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }
}

// =============================================================================
// Station
// =============================================================================

/// Every piece of state a till needs, opened from one data directory.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Create data dir, receipts/, backups/                               │
/// │  2. Load settings.toml (defaults + warning if missing or invalid)      │
/// │  3. Open till.db: WAL, foreign keys, run pending migrations            │
/// │  4. Create the default admin if no active admin exists                 │
/// │  5. Build state objects (empty cart, no session)                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug)]
pub struct Station {
    pub paths: DataDir,
    pub db: DbState,
    pub cart: CartState,
    pub session: SessionState,
    pub settings: SettingsState,
    pub printer: PrinterState,
}

impl Station {
    pub async fn open(paths: DataDir) -> ApiResult<Self> {
        paths.ensure()?;
        info!(data_dir = %paths.root().display(), "Opening station");

        let settings_path = paths.settings_path();
        let overrides = EnvOverrides::from_env();
        if !overrides.is_empty() {
            info!(?overrides, "Settings overridden from environment");
        }
        let stored = Settings::stored_or_default(&settings_path, &overrides);

        let db = Database::new(DbConfig::new(paths.db_path())).await?;
        info!("Database connected and migrations applied");

        auth::ensure_default_admin(&db).await?;

        Ok(Station {
            db: DbState::new(db),
            cart: CartState::new(),
            session: SessionState::new(),
            settings: SettingsState::with_overrides(settings_path, stored, overrides),
            printer: PrinterState::new(paths.receipts_dir()),
            paths,
        })
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        self.db.read().await.close().await;
    }
}
