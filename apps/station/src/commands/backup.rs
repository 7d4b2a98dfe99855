//! # Backup Commands
//!
//! Admin-only wrappers over [`crate::backup`].
//!
//! A restore puts the till back to an earlier point in time: sessions and
//! carts from "after" that point make no sense, so the restore ends the
//! session and empties the cart. The admin logs in again against the
//! restored user table.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::backup::{self, BackupInfo, RestoreOutcome};
use crate::error::ApiResult;
use crate::state::{CartState, DbState, SessionState};

pub async fn create_backup(
    db: &DbState,
    session: &SessionState,
    backups_dir: PathBuf,
) -> ApiResult<BackupInfo> {
    let admin = session.require_admin().await?;
    debug!("create_backup command");

    let db = db.read().await;
    let info = backup::create_backup(&db, &backups_dir).await?;
    info!(file = %info.file_name, by = %admin.username, "Backup requested");
    Ok(info)
}

pub async fn list_backups(
    session: &SessionState,
    backups_dir: PathBuf,
) -> ApiResult<Vec<BackupInfo>> {
    session.require_admin().await?;
    debug!("list_backups command");
    backup::list_backups(&backups_dir)
}

/// Replaces the database with `source`, then logs everyone out.
pub async fn restore_backup(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    backups_dir: PathBuf,
    source: PathBuf,
) -> ApiResult<RestoreOutcome> {
    let admin = session.require_admin().await?;
    debug!(source = %source.display(), "restore_backup command");

    let outcome = backup::restore_backup(db, &backups_dir, &source).await?;

    cart.clear().await;
    session.clear().await;
    info!(
        source = %outcome.restored_from,
        by = %admin.username,
        "Restore complete, session ended"
    );
    Ok(outcome)
}
