//! # Backup & Restore
//!
//! Whole-database copies kept in `<data_dir>/backups`.
//!
//! ## Restore Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    restore_backup(source)                               │
//! │                                                                         │
//! │  1. source exists, is not the live file, starts "SQLite format 3"     │
//! │  2. take the DbState write lock (waits for in-flight commands)         │
//! │  3. pre_restore_<ts>.db  ◄── safety copy of the live database          │
//! │  4. close pool, copy source over till.db, drop -wal/-shm               │
//! │  5. reopen, run migrations, swap the new handle into DbState           │
//! │  6. create the default admin if the restored file has no active admin  │
//! │                                                                         │
//! │  Failure after step 4 began: reopen whatever is on disk so the till   │
//! │  keeps running, and report the safety copy's path.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::state::DbState;
use till_db::Database;

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// A backup file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub path: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl BackupInfo {
    fn from_path(path: &Path) -> ApiResult<Self> {
        let meta = fs::metadata(path).map_err(|e| ApiError::backup(e.to_string()))?;
        Ok(BackupInfo {
            path: path.display().to_string(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size_bytes: meta.len(),
            modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub restored_from: String,
    /// Copy of the database as it was just before the restore.
    pub safety_backup: BackupInfo,
}

/// `<prefix>_<YYYYMMDD_HHMMSS>.db`, with `_2`, `_3`... appended if that
/// name is taken.
fn unique_backup_path(dir: &Path, prefix: &str) -> PathBuf {
    let stem = format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"));
    let mut path = dir.join(format!("{}.db", stem));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{}_{}.db", stem, n));
        n += 1;
    }
    path
}

/// True if the file starts with the SQLite header.
pub fn is_sqlite_file(path: &Path) -> bool {
    let mut header = [0u8; 16];
    fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut header))
        .map(|_| &header == SQLITE_MAGIC)
        .unwrap_or(false)
}

async fn backup_with_prefix(db: &Database, dir: &Path, prefix: &str) -> ApiResult<BackupInfo> {
    fs::create_dir_all(dir).map_err(|e| ApiError::backup(e.to_string()))?;
    let dest = unique_backup_path(dir, prefix);
    db.backup_to(&dest).await?;
    BackupInfo::from_path(&dest)
}

/// Writes `till_backup_<ts>.db` into `backups_dir`.
pub async fn create_backup(db: &Database, backups_dir: &Path) -> ApiResult<BackupInfo> {
    let info = backup_with_prefix(db, backups_dir, "till_backup").await?;
    info!(path = %info.path, size = info.size_bytes, "Backup created");
    Ok(info)
}

/// Replaces the live database with `source`.
pub async fn restore_backup(
    db_state: &DbState,
    backups_dir: &Path,
    source: &Path,
) -> ApiResult<RestoreOutcome> {
    if !source.is_file() {
        return Err(ApiError::backup(format!(
            "Backup file not found: {}",
            source.display()
        )));
    }
    let live = db_state.read().await.path().to_path_buf();
    if same_file(source, &live) {
        return Err(ApiError::backup("Cannot restore the live database onto itself"));
    }
    if !is_sqlite_file(source) {
        return Err(ApiError::backup(format!(
            "Not a SQLite database: {}",
            source.display()
        )));
    }

    let mut guard = db_state.write().await;

    let safety_backup = backup_with_prefix(&guard, backups_dir, "pre_restore").await?;
    info!(path = %safety_backup.path, "Safety backup written before restore");

    let config = guard.config().clone();
    match guard.clone().replace_with(source).await {
        Ok(restored) => {
            *guard = restored;
            if let Err(e) = auth::ensure_default_admin(&guard).await {
                error!(error = %e, "Could not ensure an admin on the restored database");
            }
        }
        Err(e) => {
            error!(error = %e, "Restore failed, reopening database");
            match Database::new(config).await {
                Ok(reopened) => *guard = reopened,
                Err(reopen_err) => {
                    error!(error = %reopen_err, "Could not reopen database after failed restore")
                }
            }
            return Err(ApiError::backup(format!(
                "Restore failed: {}. The previous database was saved to {}",
                e, safety_backup.path
            )));
        }
    }

    info!(source = %source.display(), "Database restored");
    Ok(RestoreOutcome {
        restored_from: source.display().to_string(),
        safety_backup,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Backups in `dir`, newest first. A missing directory has none.
pub fn list_backups(dir: &Path) -> ApiResult<Vec<BackupInfo>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ApiError::backup(e.to_string())),
    };

    let mut backups = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("db") {
            continue;
        }
        match BackupInfo::from_path(&path) {
            Ok(info) => backups.push(info),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable backup"),
        }
    }

    backups.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| b.file_name.cmp(&a.file_name))
    });
    Ok(backups)
}
