//! # Auth Commands
//!
//! Starting and ending a till session.

use serde::Deserialize;
use tracing::{debug, info};

use crate::auth;
use crate::error::ApiResult;
use crate::state::{CartState, DbState, Session, SessionState};

/// Password change form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Logs in and starts a session. Any cart left by the previous session is
/// discarded.
pub async fn login(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    username: String,
    password: String,
) -> ApiResult<Session> {
    debug!(username = %username, "login command");

    let started = {
        let db = db.read().await;
        auth::login(&db, &username, &password).await?
    };

    cart.clear().await;
    session.set(started.clone()).await;
    Ok(started)
}

/// Ends the session and empties the cart.
pub async fn logout(cart: &CartState, session: &SessionState) -> ApiResult<()> {
    debug!("logout command");

    if let Some(ended) = session.clear().await {
        info!(username = %ended.username, "Logout");
    }
    cart.clear().await;
    Ok(())
}

/// The logged-in user.
pub async fn current_session(session: &SessionState) -> ApiResult<Session> {
    session.current().await
}

pub async fn change_password(
    db: &DbState,
    session: &SessionState,
    request: ChangePasswordRequest,
) -> ApiResult<()> {
    debug!("change_password command");
    let session = session.current().await?;

    let db = db.read().await;
    auth::change_password(
        &db,
        &session,
        &request.current_password,
        &request.new_password,
        &request.confirm_password,
    )
    .await
}
