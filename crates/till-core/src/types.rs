//! # Domain Types
//!
//! Core domain types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (barcode)   │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  selling_price  │   │  receipt_number │   │  product_id(FK) │       │
//! │  │  stocked / sold │   │  cashier_id(FK) │   │  unit price     │       │
//! │  └─────────────────┘   │  total_cents    │   │  (snapshot)     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │      User       │   │      Role       │                             │
//! │  │  id (UUID)      │   │  Admin          │                             │
//! │  │  username       │   │  Cashier        │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Products are keyed by the code printed on the bottle (usually an EAN-13
//! barcode) so a scan maps straight to a row. Users, sales and sale items use
//! UUID v4 keys; sales also carry a human-readable receipt number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
///
/// ## Invariant
/// `0 <= quantity_sold <= quantity_stocked`. Both counters only ever grow:
/// restocking raises `quantity_stocked`, every committed sale line raises
/// `quantity_sold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Product code / barcode.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional longer description.
    pub description: Option<String>,

    /// Bottle volume, printed on receipts when non-zero.
    pub milliliters: i64,

    /// Purchase cost in minor units.
    pub cost_price_cents: i64,

    /// Selling price in minor units.
    pub selling_price_cents: i64,

    /// Cumulative units received.
    pub quantity_stocked: i64,

    /// Cumulative units sold.
    pub quantity_sold: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Units still on the shelf.
    #[inline]
    pub fn available(&self) -> i64 {
        self.quantity_stocked - self.quantity_sold
    }

    /// Profit per unit.
    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_minor(self.selling_price_cents - self.cost_price_cents)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_minor(self.selling_price_cents)
    }

    /// Checks whether `quantity` units could be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.available() >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub milliliters: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity_stocked: i64,
}

/// Editable product fields. `quantity_sold` is never editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub milliliters: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity_stocked: i64,
}

impl From<&Product> for ProductUpdate {
    fn from(p: &Product) -> Self {
        ProductUpdate {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            milliliters: p.milliliters,
            cost_price_cents: p.cost_price_cents,
            selling_price_cents: p.selling_price_cents,
            quantity_stocked: p.quantity_stocked,
        }
    }
}

// =============================================================================
// Users
// =============================================================================

/// What a user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages inventory, users, settings and backups.
    Admin,
    /// Rings up sales.
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cashier" => Ok(Role::Cashier),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,

    /// argon2 PHC string. Never leaves the backend.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale header. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// `YYYYMMDD-NNNN`, NNNN counting sales of that day.
    pub receipt_number: String,

    pub cashier_id: String,

    /// Cashier name at time of sale (frozen).
    pub cashier_name: String,

    /// Sum of line totals.
    pub total_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Position in the cart, starting at 1.
    pub line_no: i64,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Bottle volume at time of sale (frozen).
    pub milliliters_snapshot: i64,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.line_total_cents)
    }
}

/// A sale with its items resolved, as returned by checkout and consumed by
/// the receipt printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleWithItems {
    /// Total recomputed from the items.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(SaleItem::line_total).sum()
    }

    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stocked: i64, sold: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "6001234567890".to_string(),
            name: "Nile Special".to_string(),
            description: None,
            milliliters: 500,
            cost_price_cents: 2500,
            selling_price_cents: 3500,
            quantity_stocked: stocked,
            quantity_sold: sold,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_available_and_profit() {
        let p = product(10, 4);
        assert_eq!(p.available(), 6);
        assert_eq!(p.profit().minor(), 1000);
    }

    #[test]
    fn test_can_sell() {
        let mut p = product(10, 4);
        assert!(p.can_sell(6));
        assert!(!p.can_sell(7));
        assert!(!p.can_sell(0));

        p.is_active = false;
        assert!(!p.can_sell(1));
    }

    #[test]
    fn test_role_parse_and_serde() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("cashier".parse::<Role>().unwrap(), Role::Cashier);
        assert!("manager".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Cashier).unwrap(), "\"cashier\"");
    }

    #[test]
    fn test_user_hash_not_serialized() {
        let user = User {
            id: "u1".to_string(),
            username: "admin".to_string(),
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(user.is_admin());
    }
}
