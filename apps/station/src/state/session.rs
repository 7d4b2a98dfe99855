//! # Session State
//!
//! Who is logged in at this till. Passed explicitly to every command that
//! needs an identity; nothing reads a global "current user".

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};
use till_core::{Role, User};

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        Session {
            user_id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            logged_in_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// `PermissionDenied` unless this is an admin session.
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::permission_denied("Admin access required"))
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    current: RwLock<Option<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The logged-in session, or `Unauthenticated`.
    pub async fn current(&self) -> ApiResult<Session> {
        self.current
            .read()
            .await
            .clone()
            .ok_or_else(ApiError::unauthenticated)
    }

    /// The logged-in session if it is an admin's.
    pub async fn require_admin(&self) -> ApiResult<Session> {
        let session = self.current().await?;
        session.require_admin()?;
        Ok(session)
    }

    pub async fn set(&self, session: Session) {
        *self.current.write().await = Some(session);
    }

    /// Ends the session, returning it if there was one.
    pub async fn clear(&self) -> Option<Session> {
        self.current.write().await.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn session(role: Role) -> Session {
        Session {
            user_id: "u1".into(),
            username: "jane".into(),
            full_name: "Jane Akello".into(),
            role,
            logged_in_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_no_session_is_unauthenticated() {
        let state = SessionState::new();
        let err = state.current().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_cashier_is_not_admin() {
        let state = SessionState::new();
        state.set(session(Role::Cashier)).await;

        assert!(state.current().await.is_ok());
        let err = state.require_admin().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        state.set(session(Role::Admin)).await;
        assert!(state.require_admin().await.is_ok());

        assert!(state.clear().await.is_some());
        assert!(state.current().await.is_err());
    }
}
