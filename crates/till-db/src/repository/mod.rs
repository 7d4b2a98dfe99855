//! # Repository Module
//!
//! Database repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Station command                                                       │
//! │       │                                                                 │
//! │       │  db.sales().commit_sale(&cashier_id, &cart)                    │
//! │       ▼                                                                 │
//! │  SaleRepository ──uses──► ProductRepository::reserve_and_deduct        │
//! │       │                   (same transaction)                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Inventory ledger and product maintenance
//! - [`sale::SaleRepository`] - Sale commit and sale reads
//! - [`user::UserRepository`] - Accounts
//! - [`report::ReportRepository`] - Read-only aggregates

pub mod product;
pub mod report;
pub mod sale;
pub mod user;
