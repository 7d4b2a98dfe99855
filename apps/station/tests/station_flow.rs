//! A till day from first start to restore, driven through the command layer.

use std::path::PathBuf;

use till_core::report::ReportPeriod;
use till_core::{NewProduct, Role};
use till_station::commands::{auth, backup, cart, product, report, sale, user};
use till_station::error::ErrorCode;
use till_station::{DataDir, Station};

fn nile() -> NewProduct {
    NewProduct {
        id: "6001234567890".into(),
        name: "Nile Special".into(),
        description: None,
        milliliters: 500,
        cost_price_cents: 2500,
        selling_price_cents: 3500,
        quantity_stocked: 10,
    }
}

async fn open(dir: &std::path::Path) -> Station {
    Station::open(DataDir::new(dir)).await.unwrap()
}

#[tokio::test]
async fn test_first_start_creates_layout_and_admin() {
    let dir = tempfile::tempdir().unwrap();
    let station = open(dir.path()).await;

    assert!(station.paths.db_path().exists());
    assert!(station.paths.receipts_dir().is_dir());
    assert!(station.paths.backups_dir().is_dir());

    let admin = auth::login(
        &station.db,
        &station.cart,
        &station.session,
        "admin".into(),
        "admin123".into(),
    )
    .await
    .unwrap();
    assert_eq!(admin.role, Role::Admin);
    station.close().await;

    // Reopening neither duplicates the admin nor loses data
    let station = open(dir.path()).await;
    let db = station.db.read().await;
    assert_eq!(db.users().count_active_admins().await.unwrap(), 1);
    drop(db);
    station.close().await;
}

#[tokio::test]
async fn test_sell_report_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let s = open(dir.path()).await;

    // Admin stocks the shelf and hires a cashier
    auth::login(&s.db, &s.cart, &s.session, "admin".into(), "admin123".into())
        .await
        .unwrap();
    product::create_product(&s.db, &s.session, nile()).await.unwrap();
    user::create_user(
        &s.db,
        &s.session,
        user::CreateUserRequest {
            username: "jane".into(),
            full_name: "Jane Akello".into(),
            role: Role::Cashier,
            password: "pass1".into(),
        },
    )
    .await
    .unwrap();
    let snapshot = backup::create_backup(&s.db, &s.session, s.paths.backups_dir())
        .await
        .unwrap();
    auth::logout(&s.cart, &s.session).await.unwrap();

    // Cashier sells four
    auth::login(&s.db, &s.cart, &s.session, "jane".into(), "pass1".into())
        .await
        .unwrap();
    let scanned = product::scan_barcode(&s.db, &s.session, &s.settings, "6001234567890\n".into())
        .await
        .unwrap();
    cart::add_to_cart(&s.db, &s.cart, &s.session, scanned.id.clone(), Some(4))
        .await
        .unwrap();
    let done = sale::checkout(&s.db, &s.cart, &s.session, &s.settings, &s.printer)
        .await
        .unwrap();
    assert_eq!(done.sale.sale.total_cents, 14000);
    assert!(done.print.is_some());

    // Seven more would overdraw the shelf
    let err = cart::add_to_cart(&s.db, &s.cart, &s.session, scanned.id.clone(), Some(7))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);

    let mine = report::my_sales(&s.db, &s.session, ReportPeriod::Day)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    auth::logout(&s.cart, &s.session).await.unwrap();

    // Admin checks the day, then rolls back to the morning backup
    auth::login(&s.db, &s.cart, &s.session, "admin".into(), "admin123".into())
        .await
        .unwrap();
    let day = report::sales_report(&s.db, &s.session, ReportPeriod::Day)
        .await
        .unwrap();
    assert_eq!(day.summary.total_sales_cents, 14000);

    backup::restore_backup(
        &s.db,
        &s.cart,
        &s.session,
        s.paths.backups_dir(),
        PathBuf::from(&snapshot.path),
    )
    .await
    .unwrap();
    assert_eq!(
        s.session.current().await.unwrap_err().code,
        ErrorCode::Unauthenticated
    );

    auth::login(&s.db, &s.cart, &s.session, "admin".into(), "admin123".into())
        .await
        .unwrap();
    let restored = product::get_product(&s.db, &s.session, nile().id).await.unwrap();
    assert_eq!(restored.quantity_sold, 0);
    assert_eq!(restored.available(), 10);

    s.close().await;
}
