//! # Cart
//!
//! The ordered list of lines a cashier builds before checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Method                  Cart Change           │
//! │  ──────────────           ──────                  ───────────           │
//! │                                                                         │
//! │  Scan / pick product ───► add() ────────────────► push or merge qty    │
//! │                                                                         │
//! │  Change quantity ───────► set_quantity() ───────► lines[i].qty = n     │
//! │                                                                         │
//! │  Remove line ───────────► remove() ─────────────► lines.remove(i)      │
//! │                                                                         │
//! │  Cancel / after sale ───► clear() ──────────────► lines.clear()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product merges)
//! - Every line quantity is in `1..=MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_ITEMS` lines
//!
//! Prices held here are for display. Checkout re-reads each product and
//! charges the price stored at that moment.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub milliliters: i64,
    /// Price when the line was added.
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    /// unit price × quantity.
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product or increases its quantity if already present.
    ///
    /// ## Returns
    /// The line's quantity after the add.
    pub fn add(
        &mut self,
        product_id: &str,
        name: &str,
        milliliters: i64,
        unit_price_cents: i64,
        quantity: i64,
    ) -> CoreResult<i64> {
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let merged = line.quantity + quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = merged;
            return Ok(merged);
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine {
            product_id: product_id.to_string(),
            name: name.to_string(),
            milliliters,
            unit_price_cents,
            quantity,
        });
        Ok(quantity)
    }

    /// Adds a product row from the ledger.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<i64> {
        if !product.is_active {
            return Err(CoreError::ProductNotFound(product.id.clone()));
        }
        self.add(
            &product.id,
            &product.name,
            product.milliliters,
            product.selling_price_cents,
            quantity,
        )
    }

    /// Sets the quantity of an existing line. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ProductNotFound(product_id.to_string())),
        }
    }

    /// Removes a line by product id.
    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Quantity currently in the cart for a product (0 if absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals at cart prices.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// Cart totals summary for command responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub unit_count: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.len(),
            unit_count: cart.unit_count(),
            total_cents: cart.total().minor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add("NILE-500", "Nile Special", 500, 3500, 2).unwrap();
        let qty = cart.add("NILE-500", "Nile Special", 500, 3500, 3).unwrap();

        assert_eq!(qty, 5);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total().minor(), 17500);
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add("B", "Bell Lager", 500, 3000, 1).unwrap();
        cart.add("A", "Uganda Waragi", 750, 25000, 1).unwrap();
        cart.add("B", "Bell Lager", 500, 3000, 1).unwrap();

        let ids: Vec<_> = cart.lines().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        assert!(cart.add("X", "X", 0, 100, 0).is_err());
        cart.add("X", "X", 0, 100, 999).unwrap();
        assert!(matches!(
            cart.add("X", "X", 0, 100, 1),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
        assert_eq!(cart.quantity_of("X"), 999);
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add(&format!("P{}", i), "P", 0, 100, 1).unwrap();
        }
        assert!(matches!(
            cart.add("ONE-MORE", "P", 0, 100, 1),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        cart.add("A", "A", 0, 1000, 1).unwrap();
        cart.add("B", "B", 0, 500, 1).unwrap();

        cart.set_quantity("A", 4).unwrap();
        assert_eq!(cart.total().minor(), 4500);

        cart.set_quantity("B", 0).unwrap();
        assert_eq!(cart.len(), 1);

        assert!(cart.remove("B").is_err());
        assert!(cart.set_quantity("Z", 2).is_err());

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(CartTotals::from(&cart).total_cents, 0);
    }
}
