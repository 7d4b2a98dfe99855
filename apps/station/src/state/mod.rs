//! # State Module
//!
//! Application state held by the station, one type per concern.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐                    │
//! │  │   DbState    │ │  CartState   │ │ SessionState │                    │
//! │  │              │ │              │ │              │                    │
//! │  │  RwLock<     │ │  Mutex<Cart> │ │  RwLock<     │                    │
//! │  │   Database>  │ │              │ │   Option<    │                    │
//! │  │              │ │              │ │   Session>>  │                    │
//! │  └──────────────┘ └──────────────┘ └──────────────┘                    │
//! │  ┌──────────────┐ ┌──────────────┐                                     │
//! │  │SettingsState │ │ PrinterState │                                     │
//! │  │              │ │              │                                     │
//! │  │  RwLock<     │ │  last        │                                     │
//! │  │   Settings>  │ │  receipt     │                                     │
//! │  └──────────────┘ └──────────────┘                                     │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: pool is thread-safe; the RwLock only guards restore        │
//! │  • CartState / SessionState: tokio locks, never held across I/O        │
//! │  • SettingsState: swapped whole on save                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All locks are `tokio::sync` locks, so a panicking command cannot poison
//! them.

mod cart;
mod db;
mod printer;
mod session;
mod settings;

pub use cart::CartState;
pub use db::DbState;
pub use printer::PrinterState;
pub use session::{Session, SessionState};
pub use settings::SettingsState;
