//! # Settings Commands
//!
//! Reading and replacing `settings.toml`. Changes take effect on the next
//! print; nothing needs a restart.

use tracing::{debug, info};

use crate::error::ApiResult;
use crate::settings::Settings;
use crate::state::{SessionState, SettingsState};

pub async fn get_settings(
    session: &SessionState,
    settings: &SettingsState,
) -> ApiResult<Settings> {
    session.current().await?;
    debug!("get_settings command");
    Ok(settings.get().await)
}

/// Validates and saves new settings. Invalid settings leave the file and
/// the running configuration untouched. Fields pinned by `TILL_*`
/// environment overrides keep their file values on disk.
pub async fn update_settings(
    session: &SessionState,
    settings: &SettingsState,
    new_settings: Settings,
) -> ApiResult<Settings> {
    let admin = session.require_admin().await?;
    debug!("update_settings command");

    settings.replace(new_settings).await?;
    info!(by = %admin.username, "Settings saved");
    Ok(settings.get().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::settings::SinkKind;
    use crate::state::Session;
    use chrono::Utc;
    use till_core::Role;

    async fn session(role: Role) -> SessionState {
        let state = SessionState::new();
        state
            .set(Session {
                user_id: "u1".into(),
                username: "someone".into(),
                full_name: "Someone".into(),
                role,
                logged_in_at: Utc::now(),
            })
            .await;
        state
    }

    #[tokio::test]
    async fn test_admin_updates_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let state = SettingsState::new(&path, Settings::default());
        let admin = session(Role::Admin).await;

        let mut changed = get_settings(&admin, &state).await.unwrap();
        changed.shop.display_name = "Corner Wines & Spirits".into();
        let saved = update_settings(&admin, &state, changed).await.unwrap();

        assert_eq!(saved.shop.display_name, "Corner Wines & Spirits");
        assert_eq!(Settings::load(&path).unwrap(), saved);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let state = SettingsState::new(&path, Settings::default());
        let admin = session(Role::Admin).await;

        let mut bad = Settings::default();
        bad.printer.sink = SinkKind::Usb;
        bad.printer.device_path = String::new();

        let err = update_settings(&admin, &state, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert_eq!(state.get().await.printer.sink, SinkKind::File);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cashier_reads_but_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let state = SettingsState::new(dir.path().join("settings.toml"), Settings::default());
        let cashier = session(Role::Cashier).await;

        assert!(get_settings(&cashier, &state).await.is_ok());
        let err = update_settings(&cashier, &state, Settings::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
