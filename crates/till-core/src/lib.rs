//! # till-core: Pure Business Logic for Till POS
//!
//! Domain types and rules shared by the database layer and the station app.
//! Nothing in here touches the disk, the network or a clock source other than
//! the `now` values callers pass in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/station (commands, printer)                 │   │
//! │  │   login ──► scan ──► add_to_cart ──► checkout ──► print        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ receipt │ │ report  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        till-db (SQLite, ledger, checkout transaction)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, User, Sale, SaleItem
//! - [`money`] - Integer money and currency formatting
//! - [`cart`] - In-memory cart with line limits
//! - [`receipt`] - Plain-text receipt layout
//! - [`report`] - Report periods and date ranges
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::cart::Cart;
//!
//! let mut cart = Cart::new();
//! cart.add("6001234567890", "Nile Special", 500, 3500, 2).unwrap();
//! cart.add("6001234567890", "Nile Special", 500, 3500, 1).unwrap();
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total().minor(), 10500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{CurrencyFormat, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Shortest password accepted for an account.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Username created on first start when no admin exists.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the first-start admin. Must be changed after install.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
