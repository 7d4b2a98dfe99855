//! # Sale Commands
//!
//! Checkout and sale lookup.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    checkout()                                           │
//! │                                                                         │
//! │  1. session.current()         cashier_id comes from the session        │
//! │  2. cart.snapshot()           the cart itself is left untouched        │
//! │  3. sales().commit_sale()     one transaction under the checkout lock  │
//! │         │                                                               │
//! │         ├── Err ──► return error, cart unchanged, nothing recorded     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  4. cart.clear()                                                        │
//! │  5. printer.print()           failure is reported in the response,     │
//! │                               the sale stays committed                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{ApiError, ApiResult};
use crate::printer::PrintOutcome;
use crate::state::{CartState, DbState, PrinterState, SessionState, SettingsState};
use till_core::{Sale, SaleWithItems};

/// Most sales `recent_sales` will return.
const MAX_RECENT: u32 = 200;

/// Result of a checkout.
///
/// `sale` is always a committed sale. Exactly one of `print` and
/// `print_error` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale: SaleWithItems,
    pub print: Option<PrintOutcome>,
    pub print_error: Option<String>,
}

/// Commits the cart as a sale and prints the receipt.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    settings: &SettingsState,
    printer: &PrinterState,
) -> ApiResult<CheckoutResponse> {
    let session = session.current().await?;
    let snapshot = cart.snapshot().await;
    debug!(
        cashier = %session.username,
        lines = snapshot.len(),
        "checkout command"
    );

    let committed = {
        let db = db.read().await;
        db.sales().commit_sale(&session.user_id, &snapshot).await?
    };
    cart.clear().await;

    info!(
        receipt_number = %committed.sale.receipt_number,
        total_cents = committed.sale.total_cents,
        "Checkout complete"
    );

    let settings = settings.get().await;
    let (print, print_error) = match printer.print(&settings, &committed).await {
        Ok(outcome) => (Some(outcome), None),
        Err(e) => {
            error!(
                receipt_number = %committed.sale.receipt_number,
                error = %e,
                "Receipt could not be printed"
            );
            (None, Some(e.to_string()))
        }
    };

    Ok(CheckoutResponse {
        sale: committed,
        print,
        print_error,
    })
}

/// A sale with its items. Cashiers can only open their own sales.
pub async fn get_sale(
    db: &DbState,
    session: &SessionState,
    sale_id: String,
) -> ApiResult<SaleWithItems> {
    let session = session.current().await?;
    debug!(sale_id = %sale_id, "get_sale command");

    let db = db.read().await;
    let sale = db.sales().get_with_items(&sale_id).await?;
    if !session.is_admin() && sale.sale.cashier_id != session.user_id {
        return Err(ApiError::permission_denied(
            "Cashiers can only view their own sales",
        ));
    }
    Ok(sale)
}

/// Looks a sale up by the number printed on its receipt.
pub async fn find_by_receipt_number(
    db: &DbState,
    session: &SessionState,
    receipt_number: String,
) -> ApiResult<SaleWithItems> {
    session.require_admin().await?;
    debug!(receipt_number = %receipt_number, "find_by_receipt_number command");

    let db = db.read().await;
    let sale = db
        .sales()
        .get_by_receipt_number(&receipt_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &receipt_number))?;
    Ok(db.sales().get_with_items(&sale.id).await?)
}

/// Newest sales across all cashiers.
pub async fn recent_sales(
    db: &DbState,
    session: &SessionState,
    limit: Option<u32>,
) -> ApiResult<Vec<Sale>> {
    session.require_admin().await?;
    let limit = limit.unwrap_or(50).clamp(1, MAX_RECENT);
    debug!(limit, "recent_sales command");

    let db = db.read().await;
    Ok(db.sales().recent(limit).await?)
}

/// Prints the last receipt again.
pub async fn reprint_last_receipt(
    session: &SessionState,
    settings: &SettingsState,
    printer: &PrinterState,
) -> ApiResult<PrintOutcome> {
    let admin = session.require_admin().await?;
    debug!("reprint_last_receipt command");

    let settings = settings.get().await;
    let outcome = printer.reprint_last(&settings).await?;
    let receipt_number = printer.last_receipt_number().await;
    info!(
        receipt_number = ?receipt_number,
        by = %admin.username,
        "Receipt reprinted"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::settings::{Settings, SinkKind};
    use crate::state::Session;
    use till_core::{NewProduct, Role};
    use till_db::{Database, DbConfig, NewUser};

    struct Till {
        dir: tempfile::TempDir,
        db: DbState,
        cart: CartState,
        session: SessionState,
        settings: SettingsState,
        printer: PrinterState,
    }

    async fn till() -> Till {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&NewProduct {
                id: "P".into(),
                name: "Nile Special".into(),
                description: None,
                milliliters: 500,
                cost_price_cents: 2500,
                selling_price_cents: 3500,
                quantity_stocked: 10,
            })
            .await
            .unwrap();
        let cashier = db
            .users()
            .create(&NewUser {
                username: "jane".into(),
                full_name: "Jane Akello".into(),
                role: Role::Cashier,
                password_hash: "x".into(),
            })
            .await
            .unwrap();

        let session = SessionState::new();
        session.set(Session::for_user(&cashier)).await;

        Till {
            db: DbState::new(db),
            cart: CartState::new(),
            session,
            settings: SettingsState::new(dir.path().join("settings.toml"), Settings::default()),
            printer: PrinterState::new(dir.path().join("receipts")),
            dir,
        }
    }

    async fn run_checkout(t: &Till) -> ApiResult<CheckoutResponse> {
        checkout(&t.db, &t.cart, &t.session, &t.settings, &t.printer).await
    }

    #[tokio::test]
    async fn test_checkout_commits_clears_and_prints() {
        let t = till().await;
        t.cart
            .with_cart_mut(|c| c.add("P", "Nile Special", 500, 3500, 4))
            .await
            .unwrap();

        let response = run_checkout(&t).await.unwrap();
        assert_eq!(response.sale.sale.total_cents, 14000);
        assert_eq!(response.sale.sale.cashier_name, "Jane Akello");
        assert!(t.cart.snapshot().await.is_empty());

        let print = response.print.unwrap();
        assert_eq!(print.sink, SinkKind::File);
        let text = std::fs::read_to_string(&print.location).unwrap();
        assert!(text.contains(&response.sale.sale.receipt_number));
        assert!(response.print_error.is_none());
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let t = till().await;
        t.cart
            .with_cart_mut(|c| c.add("P", "Nile Special", 500, 3500, 11))
            .await
            .unwrap();

        let err = run_checkout(&t).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(t.cart.snapshot().await.quantity_of("P"), 11);
        assert!(t.printer.last_receipt_number().await.is_none());

        t.cart.clear().await;
        let err = run_checkout(&t).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyCart);
    }

    #[tokio::test]
    async fn test_print_failure_does_not_fail_sale() {
        let t = till().await;
        // A plain file where the receipts directory should be
        let blocked = t.dir.path().join("receipts");
        std::fs::write(&blocked, b"").unwrap();

        t.cart
            .with_cart_mut(|c| c.add("P", "Nile Special", 500, 3500, 1))
            .await
            .unwrap();

        let response = run_checkout(&t).await.unwrap();
        assert!(response.print.is_none());
        assert!(response.print_error.is_some());

        let db = t.db.read().await;
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cashier_sees_only_own_sales() {
        let t = till().await;
        t.cart
            .with_cart_mut(|c| c.add("P", "Nile Special", 500, 3500, 1))
            .await
            .unwrap();
        let sale_id = run_checkout(&t).await.unwrap().sale.sale.id;

        assert!(get_sale(&t.db, &t.session, sale_id.clone()).await.is_ok());

        let mut other = t.session.current().await.unwrap();
        other.user_id = "someone-else".into();
        t.session.set(other).await;
        let err = get_sale(&t.db, &t.session, sale_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = recent_sales(&t.db, &t.session, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_admin_reprints_last_receipt() {
        let t = till().await;
        t.cart
            .with_cart_mut(|c| c.add("P", "Nile Special", 500, 3500, 2))
            .await
            .unwrap();
        let receipt_number = run_checkout(&t).await.unwrap().sale.sale.receipt_number;

        let err = reprint_last_receipt(&t.session, &t.settings, &t.printer)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let mut admin = t.session.current().await.unwrap();
        admin.role = Role::Admin;
        t.session.set(admin).await;

        let outcome = reprint_last_receipt(&t.session, &t.settings, &t.printer)
            .await
            .unwrap();
        assert!(outcome.location.contains(&receipt_number));

        let found = find_by_receipt_number(&t.db, &t.session, receipt_number.clone())
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(recent_sales(&t.db, &t.session, Some(5)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reprint_with_nothing_printed() {
        let t = till().await;
        let mut admin = t.session.current().await.unwrap();
        admin.role = Role::Admin;
        t.session.set(admin).await;

        let err = reprint_last_receipt(&t.session, &t.settings, &t.printer)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PrintError);
    }
}
