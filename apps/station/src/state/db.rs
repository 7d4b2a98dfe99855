//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! ## Thread Safety
//! The pool inside `Database` is already thread-safe, so commands share the
//! read side of the lock and run concurrently. Only restore takes the write
//! side: it waits for in-flight commands, swaps in the reopened database,
//! and every later command sees the new one.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn search_products(db: &DbState, query: String) -> ApiResult<Vec<Product>> {
//!     let db = db.read().await;
//!     Ok(db.products().search(&query, 20).await?)
//! }
//! ```

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use till_db::Database;

#[derive(Debug)]
pub struct DbState {
    db: RwLock<Database>,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState {
            db: RwLock::new(db),
        }
    }

    /// Shared access for normal commands.
    pub async fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.db.read().await
    }

    /// Exclusive access, used to swap the database on restore.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Database> {
        self.db.write().await
    }
}
