//! # Cart Commands
//!
//! Building up the cart before checkout.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                        │
//! │  │  Empty   │────►│ In Cart  │────►│ Committed│                        │
//! │  │  Cart    │     │          │     │   Sale   │                        │
//! │  └──────────┘     └──────────┘     └──────────┘                        │
//! │       ▲                │                 │                              │
//! │       │           add_to_cart       checkout                           │
//! │       │           update_cart_item  (sale.rs)                          │
//! │       │           remove_from_cart       │                              │
//! │       │                │                 │                              │
//! │       └── clear_cart ──┘◄────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Availability is checked here so the cashier hears about a short shelf
//! while scanning. It is only advisory: checkout re-checks every line under
//! the checkout lock.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{CartState, DbState, SessionState};
use till_core::validation::validate_quantity;
use till_core::{Cart, CartLine, CartTotals, CoreError};

/// Cart lines plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines().to_vec(),
            totals: CartTotals::from(cart),
        }
    }
}

pub async fn get_cart(cart: &CartState, session: &SessionState) -> ApiResult<CartResponse> {
    session.current().await?;
    debug!("get_cart command");
    Ok(cart.with_cart(|c| CartResponse::from(c)).await)
}

/// Adds a product, merging with its existing line.
///
/// ## Behavior
/// - Product must be active
/// - Quantity already in the cart plus `quantity` must not exceed what is
///   available on the shelf
/// - The line keeps the price read here; checkout charges the price at
///   commit time
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    product_id: String,
    quantity: Option<i64>,
) -> ApiResult<CartResponse> {
    session.current().await?;
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = %product_id, quantity = %quantity, "add_to_cart command");

    validate_quantity(quantity)?;
    let product = {
        let db = db.read().await;
        db.products().get_sellable(&product_id).await?
    };

    let response = cart
        .with_cart_mut(|c| {
            let wanted = c.quantity_of(&product.id) + quantity;
            if wanted > product.available() {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    available: product.available(),
                    requested: wanted,
                });
            }
            c.add_product(&product, quantity)?;
            Ok(CartResponse::from(&*c))
        })
        .await?;
    Ok(response)
}

/// Sets a line's quantity. Zero removes the line.
pub async fn update_cart_item(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    product_id: String,
    quantity: i64,
) -> ApiResult<CartResponse> {
    session.current().await?;
    debug!(product_id = %product_id, quantity = %quantity, "update_cart_item command");

    if quantity > 0 {
        let available = {
            let db = db.read().await;
            db.products().get_available(&product_id).await?
        };
        if quantity > available {
            return Err(CoreError::InsufficientStock {
                product_id,
                available,
                requested: quantity,
            }
            .into());
        }
    }

    let response = cart
        .with_cart_mut(|c| {
            c.set_quantity(&product_id, quantity)?;
            Ok::<_, CoreError>(CartResponse::from(&*c))
        })
        .await?;
    Ok(response)
}

pub async fn remove_from_cart(
    cart: &CartState,
    session: &SessionState,
    product_id: String,
) -> ApiResult<CartResponse> {
    session.current().await?;
    debug!(product_id = %product_id, "remove_from_cart command");

    let response = cart
        .with_cart_mut(|c| {
            c.remove(&product_id)?;
            Ok::<_, CoreError>(CartResponse::from(&*c))
        })
        .await?;
    Ok(response)
}

pub async fn clear_cart(cart: &CartState, session: &SessionState) -> ApiResult<CartResponse> {
    session.current().await?;
    debug!("clear_cart command");

    cart.clear().await;
    Ok(CartResponse::from(&Cart::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::Session;
    use chrono::Utc;
    use till_core::{NewProduct, Role};
    use till_db::{Database, DbConfig};

    async fn till() -> (DbState, CartState, SessionState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&NewProduct {
                id: "P".into(),
                name: "Nile Special".into(),
                description: None,
                milliliters: 500,
                cost_price_cents: 2500,
                selling_price_cents: 3500,
                quantity_stocked: 5,
            })
            .await
            .unwrap();

        let session = SessionState::new();
        session
            .set(Session {
                user_id: "u1".into(),
                username: "jane".into(),
                full_name: "Jane Akello".into(),
                role: Role::Cashier,
                logged_in_at: Utc::now(),
            })
            .await;
        (DbState::new(db), CartState::new(), session)
    }

    #[tokio::test]
    async fn test_add_merges_and_totals() {
        let (db, cart, session) = till().await;

        add_to_cart(&db, &cart, &session, "P".into(), None).await.unwrap();
        let response = add_to_cart(&db, &cart, &session, "P".into(), Some(2))
            .await
            .unwrap();

        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.lines[0].quantity, 3);
        assert_eq!(response.totals.total_cents, 10500);
        assert_eq!(get_cart(&cart, &session).await.unwrap(), response);
    }

    #[tokio::test]
    async fn test_add_beyond_shelf_is_refused() {
        let (db, cart, session) = till().await;
        add_to_cart(&db, &cart, &session, "P".into(), Some(4)).await.unwrap();

        let err = add_to_cart(&db, &cart, &session, "P".into(), Some(2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Insufficient stock for P: available 5, requested 6");
        assert_eq!(cart.snapshot().await.quantity_of("P"), 4);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let (db, cart, session) = till().await;
        add_to_cart(&db, &cart, &session, "P".into(), Some(1)).await.unwrap();

        let err = update_cart_item(&db, &cart, &session, "P".into(), 6)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let response = update_cart_item(&db, &cart, &session, "P".into(), 5)
            .await
            .unwrap();
        assert_eq!(response.totals.unit_count, 5);

        let response = update_cart_item(&db, &cart, &session, "P".into(), 0)
            .await
            .unwrap();
        assert!(response.lines.is_empty());

        let err = remove_from_cart(&cart, &session, "P".into()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_unknown_product_and_no_session() {
        let (db, cart, session) = till().await;

        let err = add_to_cart(&db, &cart, &session, "NOPE".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        session.clear().await;
        let err = get_cart(&cart, &session).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let (db, cart, session) = till().await;
        add_to_cart(&db, &cart, &session, "P".into(), Some(2)).await.unwrap();

        let response = clear_cart(&cart, &session).await.unwrap();
        assert!(response.lines.is_empty());
        assert_eq!(response.totals.total_cents, 0);
    }
}
