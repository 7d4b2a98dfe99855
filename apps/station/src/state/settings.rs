//! # Settings State
//!
//! The loaded `settings.toml`. Read by every print, replaced whole by the
//! admin settings command after validation and a successful save.
//!
//! What is held is the file's own values. `TILL_*` overrides are layered on
//! at read time and never written back.

use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::info;

use crate::settings::{EnvOverrides, Settings, SettingsResult};

#[derive(Debug)]
pub struct SettingsState {
    path: PathBuf,
    overrides: EnvOverrides,
    stored: RwLock<Settings>,
}

impl SettingsState {
    /// State with no environment overrides.
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self::with_overrides(path, settings, EnvOverrides::default())
    }

    pub fn with_overrides(
        path: impl Into<PathBuf>,
        stored: Settings,
        overrides: EnvOverrides,
    ) -> Self {
        SettingsState {
            path: path.into(),
            overrides,
            stored: RwLock::new(stored),
        }
    }

    /// Copy of the settings in effect, overrides applied.
    pub async fn get(&self) -> Settings {
        let mut settings = self.stored.read().await.clone();
        self.overrides.apply(&mut settings);
        settings
    }

    /// Validates, writes to disk, then swaps in `settings`. On any error the
    /// old settings stay in effect.
    ///
    /// Fields still carrying an override value are saved with the file's
    /// previous value, so a read-edit-save round trip leaves the overrides
    /// out of `settings.toml`.
    pub async fn replace(&self, settings: Settings) -> SettingsResult<()> {
        let mut stored = self.stored.write().await;

        let mut to_store = settings;
        self.overrides.unapply(&mut to_store, &stored);

        let mut effective = to_store.clone();
        self.overrides.apply(&mut effective);
        effective.validate()?;

        to_store.write(&self.path)?;
        *stored = to_store;
        info!("Settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SinkKind;

    #[tokio::test]
    async fn test_invalid_replace_keeps_old() {
        let dir = tempfile::tempdir().unwrap();
        let state = SettingsState::new(dir.path().join("settings.toml"), Settings::default());

        let mut bad = Settings::default();
        bad.printer.sink = SinkKind::Usb;
        assert!(state.replace(bad).await.is_err());
        assert_eq!(state.get().await, Settings::default());

        let mut good = Settings::default();
        good.shop.display_name = "Corner Wines & Spirits".into();
        state.replace(good.clone()).await.unwrap();
        assert_eq!(state.get().await, good);
        assert!(dir.path().join("settings.toml").exists());
    }

    #[tokio::test]
    async fn test_overrides_stay_out_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let overrides = EnvOverrides {
            printer_sink: Some(SinkKind::Usb),
            printer_device: Some("/dev/usb/lp0".into()),
            shop_name: Some("Night Shop".into()),
        };
        let state = SettingsState::with_overrides(&path, Settings::default(), overrides);

        let mut edited = state.get().await;
        assert_eq!(edited.printer.sink, SinkKind::Usb);
        assert_eq!(edited.shop.display_name, "Night Shop");
        edited.printer.paper_width = 42;
        state.replace(edited).await.unwrap();

        let on_disk = Settings::read_file(&path).unwrap();
        assert_eq!(on_disk.printer.sink, SinkKind::File);
        assert_eq!(on_disk.printer.device_path, Settings::default().printer.device_path);
        assert_eq!(on_disk.shop.display_name, Settings::default().shop.display_name);
        assert_eq!(on_disk.printer.paper_width, 42);

        // still in effect for this process
        let current = state.get().await;
        assert_eq!(current.printer.sink, SinkKind::Usb);
        assert_eq!(current.printer.paper_width, 42);
    }
}
