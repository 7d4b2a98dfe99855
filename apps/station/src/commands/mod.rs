//! # Station Commands
//!
//! Every operation a till UI can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── auth.rs      ◄─── login, logout, change password
//! ├── product.rs   ◄─── search, scan, inventory management
//! ├── cart.rs      ◄─── cart manipulation
//! ├── sale.rs      ◄─── checkout, sale lookup, reprint
//! ├── user.rs      ◄─── account management (admin)
//! ├── report.rs    ◄─── sales, cashier, product, inventory reports
//! ├── backup.rs    ◄─── backup, restore (admin)
//! └── settings.rs  ◄─── settings.toml read/update
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  UI                                                                     │
//! │  ──                                                                     │
//! │  add_to_cart(&station.db, &station.cart, &station.session, id, 2)      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  1. session.current()  ──► Unauthenticated if nobody is logged in      │
//! │  2. require_admin()    ──► PermissionDenied for admin-only commands    │
//! │  3. db.read()          ──► shared handle, blocks only during restore   │
//! │  4. repository call    ──► DbError / CoreError                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Result<T, ApiError>   ──► { code: "INSUFFICIENT_STOCK", message }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs the cart and a session
//! async fn get_cart(cart: &CartState, session: &SessionState)
//!
//! // Needs the ledger too
//! async fn add_to_cart(db: &DbState, cart: &CartState, session: &SessionState, ...)
//! ```

pub mod auth;
pub mod backup;
pub mod cart;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod user;
