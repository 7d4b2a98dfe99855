//! Whole-file backup and restore.

use till_core::{Cart, NewProduct, Role};
use till_db::{Database, DbConfig, DbError, NewUser};

async fn seeded(path: &std::path::Path) -> (Database, String) {
    let db = Database::new(DbConfig::new(path)).await.unwrap();
    let cashier = db
        .users()
        .create(&NewUser {
            username: "jane".to_string(),
            full_name: "Jane Akello".to_string(),
            role: Role::Cashier,
            password_hash: "unused".to_string(),
        })
        .await
        .unwrap();
    db.products()
        .insert(&NewProduct {
            id: "P".to_string(),
            name: "Nile Special".to_string(),
            description: None,
            milliliters: 500,
            cost_price_cents: 2500,
            selling_price_cents: 3500,
            quantity_stocked: 10,
        })
        .await
        .unwrap();
    (db, cashier.id)
}

#[tokio::test]
async fn backup_then_restore_rolls_back_later_sales() {
    let dir = tempfile::tempdir().unwrap();
    let (db, cashier) = seeded(&dir.path().join("till.db")).await;

    let backup = dir.path().join("backup.db");
    db.backup_to(&backup).await.unwrap();
    assert!(backup.exists());

    let mut cart = Cart::new();
    cart.add("P", "Nile Special", 500, 3500, 4).unwrap();
    db.sales().commit_sale(&cashier, &cart).await.unwrap();
    assert_eq!(db.products().get_available("P").await.unwrap(), 6);

    let db = db.replace_with(&backup).await.unwrap();
    assert!(db.health_check().await);
    assert_eq!(db.products().get_available("P").await.unwrap(), 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
    db.close().await;
}

#[tokio::test]
async fn backup_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let (db, _) = seeded(&dir.path().join("till.db")).await;

    let backup = dir.path().join("backup.db");
    db.backup_to(&backup).await.unwrap();
    assert!(matches!(
        db.backup_to(&backup).await,
        Err(DbError::Backup(_))
    ));
    db.close().await;
}

#[tokio::test]
async fn restore_from_missing_file_fails_without_closing() {
    let dir = tempfile::tempdir().unwrap();
    let (db, _) = seeded(&dir.path().join("till.db")).await;
    let keep = db.clone();

    let err = db
        .replace_with(&dir.path().join("nope.db"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Backup(_)));
    assert!(keep.health_check().await);
    keep.close().await;
}
