//! # User Repository
//!
//! Account storage. Password hashing happens in the station app; this
//! repository only stores and returns PHC strings.
//!
//! Users are never deleted. Deactivated accounts cannot log in or ring up
//! sales, but their past sales keep pointing at them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::validation::{validate_full_name, validate_username};
use till_core::{CoreError, Role, User};

const USER_COLUMNS: &str = "id, username, full_name, role, password_hash, is_active, created_at";

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    /// Already-hashed password.
    pub password_hash: String,
}

/// Admin edit of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    /// New hash when the admin resets the password.
    pub password_hash: Option<String>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an active account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    pub async fn create(&self, new: &NewUser) -> DbResult<User> {
        validate_username(&new.username)?;
        validate_full_name(&new.full_name)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new.username.trim().to_string(),
            full_name: new.full_name.trim().to_string(),
            role: new.role,
            password_hash: new.password_hash.clone(),
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, role, password_hash, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", &user.username),
            other => other,
        })?;

        info!(username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Looks up an account by username, active or not.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Lists all accounts by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Applies an admin edit.
    pub async fn update(&self, update: &UserUpdate) -> DbResult<User> {
        validate_full_name(&update.full_name)?;
        debug!(id = %update.id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                full_name = ?2,
                role = ?3,
                is_active = ?4,
                password_hash = COALESCE(?5, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(&update.id)
        .bind(update.full_name.trim())
        .bind(update.role)
        .bind(update.is_active)
        .bind(update.password_hash.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(update.id.clone()).into());
        }

        self.get_by_id(&update.id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &update.id))
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }
        info!(id = %id, active, "User active flag changed");
        Ok(())
    }

    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Number of active admins.
    pub async fn count_active_admins(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
