//! # Authentication
//!
//! argon2 password hashing, login, first-start admin and password changes.
//!
//! ## Login Flow
//! ```text
//! username, password
//!      │
//!      ▼
//! users.get_by_username ──► none / inactive ──┐
//!      │                                       │
//!      ▼                                       ▼
//! argon2 verify ─────────► mismatch ──► InvalidCredentials
//!      │                               ("Invalid username or password")
//!      ▼
//! Session { user_id, role, ... }
//! ```
//!
//! Every failure gives the same message so the till never reveals which
//! usernames exist.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::Session;
use till_core::validation::{validate_password, validate_password_change};
use till_core::{CoreError, Role, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use till_db::{Database, NewUser};

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Verifies credentials of an active account.
pub async fn login(db: &Database, username: &str, password: &str) -> ApiResult<Session> {
    let user = db.users().get_by_username(username).await?;

    match user {
        Some(user) if user.is_active && verify_password(password, &user.password_hash) => {
            info!(username = %user.username, role = %user.role, "Login");
            Ok(Session::for_user(&user))
        }
        _ => {
            info!(username = %username.trim(), "Login rejected");
            Err(CoreError::InvalidCredentials.into())
        }
    }
}

/// Creates the `admin` account when no active admin exists.
///
/// ## Returns
/// `true` when the account was created.
pub async fn ensure_default_admin(db: &Database) -> ApiResult<bool> {
    if db.users().count_active_admins().await? > 0 {
        return Ok(false);
    }

    if let Some(existing) = db.users().get_by_username(DEFAULT_ADMIN_USERNAME).await? {
        // An inactive or demoted "admin" exists; leave it to a human
        warn!(
            id = %existing.id,
            "No active admin, but username '{}' is taken",
            DEFAULT_ADMIN_USERNAME
        );
        return Ok(false);
    }

    db.users()
        .create(&NewUser {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
        })
        .await?;

    warn!(
        "Default admin created (username '{}', password '{}'). Change the password now.",
        DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD
    );
    Ok(true)
}

/// Changes the session user's own password.
pub async fn change_password(
    db: &Database,
    session: &Session,
    current: &str,
    new_password: &str,
    confirm: &str,
) -> ApiResult<()> {
    let user = db
        .users()
        .get_by_id(&session.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &session.user_id))?;

    if !verify_password(current, &user.password_hash) {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    validate_password(new_password)?;
    validate_password_change(new_password, confirm)?;

    db.users()
        .set_password_hash(&user.id, &hash_password(new_password)?)
        .await?;

    info!(username = %user.username, "Password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use till_db::DbConfig;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_default_admin_created_once() {
        let db = db().await;

        assert!(ensure_default_admin(&db).await.unwrap());
        assert!(!ensure_default_admin(&db).await.unwrap());

        let session = login(&db, "admin", "admin123").await.unwrap();
        assert!(session.is_admin());
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let db = db().await;
        ensure_default_admin(&db).await.unwrap();

        let wrong_password = login(&db, "admin", "nope").await.unwrap_err();
        let unknown_user = login(&db, "ghost", "admin123").await.unwrap_err();

        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.code, ErrorCode::Unauthenticated);
        assert_eq!(wrong_password.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let db = db().await;
        let user = db
            .users()
            .create(&NewUser {
                username: "jane".into(),
                full_name: "Jane Akello".into(),
                role: Role::Cashier,
                password_hash: hash_password("pass1").unwrap(),
            })
            .await
            .unwrap();

        assert!(login(&db, "jane", "pass1").await.is_ok());
        db.users().set_active(&user.id, false).await.unwrap();
        assert!(login(&db, "jane", "pass1").await.is_err());
    }

    #[tokio::test]
    async fn test_change_password() {
        let db = db().await;
        ensure_default_admin(&db).await.unwrap();
        let session = login(&db, "admin", "admin123").await.unwrap();

        let err = change_password(&db, &session, "bad", "newpass", "newpass")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = change_password(&db, &session, "admin123", "newpass", "other")
            .await
            .unwrap_err();
        assert_eq!(err.message, "New passwords do not match");

        let err = change_password(&db, &session, "admin123", "abc", "abc")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        change_password(&db, &session, "admin123", "newpass", "newpass")
            .await
            .unwrap();
        assert!(login(&db, "admin", "admin123").await.is_err());
        assert!(login(&db, "admin", "newpass").await.is_ok());
    }
}
