//! # Product Commands
//!
//! Product lookup for the till and inventory management for admins.
//!
//! ## Access
//! ```text
//! ┌──────────────────────────┬──────────┬──────────┐
//! │ Command                  │ Cashier  │  Admin   │
//! ├──────────────────────────┼──────────┼──────────┤
//! │ search_products          │    ✓     │    ✓     │
//! │ get_product              │    ✓     │    ✓     │
//! │ scan_barcode             │    ✓     │    ✓     │
//! │ list_products (active)   │    ✓     │    ✓     │
//! │ list_products (all)      │          │    ✓     │
//! │ create / update          │          │    ✓     │
//! │ restock                  │          │    ✓     │
//! │ deactivate / reactivate  │          │    ✓     │
//! └──────────────────────────┴──────────┴──────────┘
//! ```

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, SessionState, SettingsState};
use till_core::{NewProduct, Product, ProductUpdate};

/// Results returned when the caller gives no limit.
const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Upper bound on a search page.
const MAX_SEARCH_LIMIT: u32 = 100;

/// Searches active products by code or name.
///
/// ## Arguments
/// * `query` - Part of the product code or name
/// * `limit` - Maximum results (default: 20, max: 100)
pub async fn search_products(
    db: &DbState,
    session: &SessionState,
    query: String,
    limit: Option<u32>,
) -> ApiResult<Vec<Product>> {
    session.current().await?;
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);
    debug!(query = %query, limit = %limit, "search_products command");

    let db = db.read().await;
    Ok(db.products().search(&query, limit).await?)
}

pub async fn get_product(
    db: &DbState,
    session: &SessionState,
    product_id: String,
) -> ApiResult<Product> {
    session.current().await?;
    debug!(product_id = %product_id, "get_product command");

    let db = db.read().await;
    db.products()
        .get_by_id(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product_id))
}

/// Resolves raw scanner input to a sellable product.
///
/// The configured barcode prefix and suffix are stripped first, so a
/// keyboard-wedge scanner's trailing newline never reaches the lookup.
pub async fn scan_barcode(
    db: &DbState,
    session: &SessionState,
    settings: &SettingsState,
    raw: String,
) -> ApiResult<Product> {
    session.current().await?;
    let code = settings.get().await.barcode.strip(&raw);
    debug!(code = %code, "scan_barcode command");

    if code.is_empty() {
        return Err(ApiError::validation("Scanned barcode is empty"));
    }

    let db = db.read().await;
    Ok(db.products().get_sellable(&code).await?)
}

/// Lists products. Including inactive products requires an admin.
pub async fn list_products(
    db: &DbState,
    session: &SessionState,
    include_inactive: bool,
) -> ApiResult<Vec<Product>> {
    let current = session.current().await?;
    if include_inactive {
        current.require_admin()?;
    }
    debug!(include_inactive, "list_products command");

    let db = db.read().await;
    Ok(db.products().list(include_inactive).await?)
}

pub async fn create_product(
    db: &DbState,
    session: &SessionState,
    product: NewProduct,
) -> ApiResult<Product> {
    let admin = session.require_admin().await?;
    debug!(product_id = %product.id, "create_product command");

    let db = db.read().await;
    let created = db.products().insert(&product).await?;
    info!(product_id = %created.id, by = %admin.username, "Product created");
    Ok(created)
}

pub async fn update_product(
    db: &DbState,
    session: &SessionState,
    update: ProductUpdate,
) -> ApiResult<Product> {
    let admin = session.require_admin().await?;
    debug!(product_id = %update.id, "update_product command");

    let db = db.read().await;
    let updated = db.products().update(&update).await?;
    info!(product_id = %updated.id, by = %admin.username, "Product updated");
    Ok(updated)
}

/// Adds received stock to a product.
pub async fn restock_product(
    db: &DbState,
    session: &SessionState,
    product_id: String,
    quantity: i64,
) -> ApiResult<Product> {
    let admin = session.require_admin().await?;
    debug!(product_id = %product_id, quantity = %quantity, "restock_product command");

    let db = db.read().await;
    let product = db.products().restock(&product_id, quantity).await?;
    info!(
        product_id = %product.id,
        quantity,
        available = product.available(),
        by = %admin.username,
        "Product restocked"
    );
    Ok(product)
}

/// Hides a product from the till. Its sales history stays intact.
pub async fn deactivate_product(
    db: &DbState,
    session: &SessionState,
    product_id: String,
) -> ApiResult<()> {
    let admin = session.require_admin().await?;
    debug!(product_id = %product_id, "deactivate_product command");

    let db = db.read().await;
    db.products().deactivate(&product_id).await?;
    info!(product_id = %product_id, by = %admin.username, "Product deactivated");
    Ok(())
}

pub async fn reactivate_product(
    db: &DbState,
    session: &SessionState,
    product_id: String,
) -> ApiResult<()> {
    let admin = session.require_admin().await?;
    debug!(product_id = %product_id, "reactivate_product command");

    let db = db.read().await;
    db.products().reactivate(&product_id).await?;
    info!(product_id = %product_id, by = %admin.username, "Product reactivated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::settings::Settings;
    use crate::state::Session;
    use chrono::Utc;
    use till_core::Role;
    use till_db::{Database, DbConfig};

    fn nile() -> NewProduct {
        NewProduct {
            id: "6001234567890".into(),
            name: "Nile Special".into(),
            description: None,
            milliliters: 500,
            cost_price_cents: 2500,
            selling_price_cents: 3500,
            quantity_stocked: 24,
        }
    }

    async fn logged_in(role: Role) -> (DbState, SessionState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = SessionState::new();
        session
            .set(Session {
                user_id: "u1".into(),
                username: "someone".into(),
                full_name: "Someone".into(),
                role,
                logged_in_at: Utc::now(),
            })
            .await;
        (DbState::new(db), session)
    }

    #[tokio::test]
    async fn test_cashier_cannot_manage_inventory() {
        let (db, session) = logged_in(Role::Cashier).await;

        let err = create_product(&db, &session, nile()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = list_products(&db, &session, true).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(list_products(&db, &session, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_inventory_lifecycle() {
        let (db, session) = logged_in(Role::Admin).await;
        let id = nile().id;

        create_product(&db, &session, nile()).await.unwrap();
        let restocked = restock_product(&db, &session, id.clone(), 6).await.unwrap();
        assert_eq!(restocked.quantity_stocked, 30);

        let mut update = ProductUpdate::from(&restocked);
        update.selling_price_cents = 4000;
        let updated = update_product(&db, &session, update).await.unwrap();
        assert_eq!(updated.selling_price_cents, 4000);

        deactivate_product(&db, &session, id.clone()).await.unwrap();
        assert!(search_products(&db, &session, "Nile".into(), None)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(list_products(&db, &session, true).await.unwrap().len(), 1);

        reactivate_product(&db, &session, id.clone()).await.unwrap();
        assert_eq!(
            search_products(&db, &session, "nile".into(), Some(500))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_restock_rejects_non_positive() {
        let (db, session) = logged_in(Role::Admin).await;
        create_product(&db, &session, nile()).await.unwrap();

        let err = restock_product(&db, &session, nile().id, 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_scan_strips_scanner_suffix() {
        let (db, session) = logged_in(Role::Admin).await;
        create_product(&db, &session, nile()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsState::new(dir.path().join("settings.toml"), Settings::default());

        let product = scan_barcode(&db, &session, &settings, "6001234567890\n".into())
            .await
            .unwrap();
        assert_eq!(product.name, "Nile Special");

        let err = scan_barcode(&db, &session, &settings, "\n".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = scan_barcode(&db, &session, &settings, "0000\n".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_requires_session() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let err = get_product(&db, &SessionState::new(), "X".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }
}
