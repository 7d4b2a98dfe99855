//! # Schema Migrations
//!
//! The SQL files in `migrations/sqlite/` are compiled into the binary and
//! applied whenever a database is opened, including right after a restore,
//! so an old backup is brought up to the current schema before use.
//!
//! ```text
//! open / restore ──► _sqlx_migrations ──► apply missing files in order
//!                    (created on first run)   0001_initial_schema.sql
//!                                             ...
//! ```
//!
//! Files are append-only: a shipped migration is never edited, a change
//! gets a new `NNNN_description.sql`.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a database's schema has been migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    /// Migrations recorded as successfully applied.
    pub applied: usize,
    /// Migrations embedded in this build.
    pub known: usize,
}

impl MigrationStatus {
    pub fn pending(&self) -> usize {
        self.known.saturating_sub(self.applied)
    }

    pub fn is_current(&self) -> bool {
        self.pending() == 0
    }
}

/// Applies every embedded migration the database has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema up to date");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;
    info!(
        from = before.applied,
        to = before.known,
        "Schema migrated"
    );
    Ok(())
}

/// Reads the migration bookkeeping table. A database that was never
/// migrated has applied nothing.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let known = MIGRATOR.iter().count();

    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if has_table {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    } else {
        0
    };

    Ok(MigrationStatus {
        applied: applied as usize,
        known,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_counts() {
        let behind = MigrationStatus { applied: 1, known: 3 };
        assert_eq!(behind.pending(), 2);
        assert!(!behind.is_current());

        // A database from a newer build is not "behind"
        let ahead = MigrationStatus { applied: 4, known: 3 };
        assert_eq!(ahead.pending(), 0);
        assert!(ahead.is_current());
    }
}
