//! # Cart State
//!
//! The till's current cart. Line math and limits live in
//! [`till_core::Cart`]; this wrapper only adds locking.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Cashier Action           Command                 Cart State Change     │
//! │  ──────────────           ───────                 ─────────────────     │
//! │                                                                         │
//! │  Scan / pick ────────────► add_to_cart() ───────► merge or push line   │
//! │                                                                         │
//! │  Change Quantity ────────► update_cart_item() ──► line.quantity = n    │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_cart() ──► drop line            │
//! │                                                                         │
//! │  Checkout OK ────────────► checkout() ──────────► clear                │
//! │                                                                         │
//! │  Checkout fails ─────────► checkout() ──────────► (unchanged)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::Mutex;

use till_core::Cart;

#[derive(Debug, Default)]
pub struct CartState {
    cart: Mutex<Cart>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| CartTotals::from(cart)).await;
    /// ```
    pub async fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().await;
        f(&cart)
    }

    /// Runs `f` with write access to the cart.
    pub async fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().await;
        f(&mut cart)
    }

    /// A copy of the cart as it is now.
    pub async fn snapshot(&self) -> Cart {
        self.cart.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.cart.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_cart_mut_and_snapshot() {
        let state = CartState::new();
        state
            .with_cart_mut(|c| c.add("P", "Nile Special", 500, 3500, 2))
            .await
            .unwrap();

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.quantity_of("P"), 2);

        state.clear().await;
        assert!(state.with_cart(|c| c.is_empty()).await);
        // the snapshot is independent
        assert_eq!(snapshot.len(), 1);
    }
}
