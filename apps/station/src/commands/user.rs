//! # User Commands
//!
//! Account management. Every command here requires an admin session.
//!
//! The till must always keep one active admin: an admin cannot deactivate
//! or demote their own account, and nobody can deactivate or demote the last
//! active admin.

use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, Session, SessionState};
use till_core::validation::validate_password;
use till_core::{Role, User};
use till_db::{Database, NewUser, UserUpdate};

/// New account form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub password: String,
}

/// Account edit form. `new_password` resets the password when set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub new_password: Option<String>,
}

pub async fn list_users(db: &DbState, session: &SessionState) -> ApiResult<Vec<User>> {
    session.require_admin().await?;
    debug!("list_users command");

    let db = db.read().await;
    Ok(db.users().list().await?)
}

pub async fn create_user(
    db: &DbState,
    session: &SessionState,
    request: CreateUserRequest,
) -> ApiResult<User> {
    let admin = session.require_admin().await?;
    debug!(username = %request.username, "create_user command");

    validate_password(&request.password)?;
    let db = db.read().await;
    let user = db
        .users()
        .create(&NewUser {
            username: request.username,
            full_name: request.full_name,
            role: request.role,
            password_hash: hash_password(&request.password)?,
        })
        .await?;

    info!(username = %user.username, role = %user.role, by = %admin.username, "User created");
    Ok(user)
}

pub async fn update_user(
    db: &DbState,
    session: &SessionState,
    request: UpdateUserRequest,
) -> ApiResult<User> {
    let admin = session.require_admin().await?;
    debug!(user_id = %request.id, "update_user command");

    let db = db.read().await;
    let keeps_admin = request.is_active && request.role == Role::Admin;
    if !keeps_admin {
        guard_admin_removal(&db, &admin, &request.id).await?;
    }

    let password_hash = match request.new_password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = db
        .users()
        .update(&UserUpdate {
            id: request.id,
            full_name: request.full_name,
            role: request.role,
            is_active: request.is_active,
            password_hash,
        })
        .await?;

    info!(username = %user.username, by = %admin.username, "User updated");
    Ok(user)
}

/// Disables an account. Its sales keep the cashier name they were made
/// under.
pub async fn deactivate_user(
    db: &DbState,
    session: &SessionState,
    user_id: String,
) -> ApiResult<()> {
    let admin = session.require_admin().await?;
    debug!(user_id = %user_id, "deactivate_user command");

    let db = db.read().await;
    guard_admin_removal(&db, &admin, &user_id).await?;
    db.users().set_active(&user_id, false).await?;

    info!(user_id = %user_id, by = %admin.username, "User deactivated");
    Ok(())
}

pub async fn reactivate_user(
    db: &DbState,
    session: &SessionState,
    user_id: String,
) -> ApiResult<()> {
    let admin = session.require_admin().await?;
    debug!(user_id = %user_id, "reactivate_user command");

    let db = db.read().await;
    db.users().set_active(&user_id, true).await?;

    info!(user_id = %user_id, by = %admin.username, "User reactivated");
    Ok(())
}

/// Refuses to take admin rights away from the caller or from the last
/// active admin.
async fn guard_admin_removal(db: &Database, admin: &Session, target_id: &str) -> ApiResult<()> {
    if target_id == admin.user_id {
        return Err(ApiError::validation(
            "You cannot deactivate or demote your own account",
        ));
    }

    let target = db
        .users()
        .get_by_id(target_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", target_id))?;

    if target.is_admin() && target.is_active && db.users().count_active_admins().await? <= 1 {
        return Err(ApiError::validation("The last active admin cannot be removed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::error::ErrorCode;

    async fn admin_logged_in() -> (DbState, SessionState) {
        let db = Database::new(till_db::DbConfig::in_memory()).await.unwrap();
        auth::ensure_default_admin(&db).await.unwrap();
        let session = SessionState::new();
        session
            .set(auth::login(&db, "admin", "admin123").await.unwrap())
            .await;
        (DbState::new(db), session)
    }

    fn cashier(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            full_name: "Jane Akello".into(),
            role: Role::Cashier,
            password: "pass1".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_login() {
        let (db, session) = admin_logged_in().await;

        let user = create_user(&db, &session, cashier("jane")).await.unwrap();
        assert_eq!(user.role, Role::Cashier);
        assert!(user.password_hash.starts_with("$argon2"));

        let guard = db.read().await;
        assert!(auth::login(&guard, "jane", "pass1").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (db, session) = admin_logged_in().await;

        let mut short = cashier("jane");
        short.password = "abc".into();
        let err = create_user(&db, &session, short).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_user(&db, &session, cashier("jo")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        create_user(&db, &session, cashier("jane")).await.unwrap();
        let err = create_user(&db, &session, cashier("jane")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_cannot_remove_self_or_last_admin() {
        let (db, session) = admin_logged_in().await;
        let me = session.current().await.unwrap();

        let err = deactivate_user(&db, &session, me.user_id.clone())
            .await
            .unwrap_err();
        assert!(err.message.contains("your own account"));

        let err = update_user(
            &db,
            &session,
            UpdateUserRequest {
                id: me.user_id.clone(),
                full_name: "Administrator".into(),
                role: Role::Cashier,
                is_active: true,
                new_password: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // A second admin may be demoted while the first remains
        let mut other = cashier("boss");
        other.role = Role::Admin;
        let other = create_user(&db, &session, other).await.unwrap();
        let demoted = update_user(
            &db,
            &session,
            UpdateUserRequest {
                id: other.id.clone(),
                full_name: other.full_name.clone(),
                role: Role::Cashier,
                is_active: true,
                new_password: Some("fresh1".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(demoted.role, Role::Cashier);

        let guard = db.read().await;
        assert!(auth::login(&guard, "boss", "fresh1").await.is_ok());
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate_cashier() {
        let (db, session) = admin_logged_in().await;
        let jane = create_user(&db, &session, cashier("jane")).await.unwrap();

        deactivate_user(&db, &session, jane.id.clone()).await.unwrap();
        {
            let guard = db.read().await;
            assert!(auth::login(&guard, "jane", "pass1").await.is_err());
        }

        reactivate_user(&db, &session, jane.id.clone()).await.unwrap();
        let users = list_users(&db, &session).await.unwrap();
        assert!(users.iter().any(|u| u.id == jane.id && u.is_active));
    }

    #[tokio::test]
    async fn test_cashier_cannot_manage_users() {
        let (db, session) = admin_logged_in().await;
        create_user(&db, &session, cashier("jane")).await.unwrap();
        {
            let guard = db.read().await;
            session
                .set(auth::login(&guard, "jane", "pass1").await.unwrap())
                .await;
        }

        let err = list_users(&db, &session).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
