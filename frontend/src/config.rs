//! Browser side of [`AppConfig`]: an optional TOML override kept in
//! `localStorage`.

use shared::config::{ConfigError, MigrationStrategy};
use shared::{AppConfig, MachineProfile};
use web_sys::Storage;

const STORAGE_KEY: &str = "schemview.config";

fn storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Stored override merged over defaults. Anything unreadable falls back to
/// defaults.
pub fn load_app_config() -> AppConfig {
    let Some(storage) = storage() else {
        return AppConfig::default();
    };
    let Some(source) = storage.get_item(STORAGE_KEY).ok().flatten() else {
        return AppConfig::default();
    };
    match AppConfig::from_toml(&source) {
        Ok(config) => {
            log::info!("using stored config override");
            config
        }
        Err(ConfigError::UnsupportedVersion(version)) => {
            let stale = shared::config::AppSection { version };
            if stale.get_migration_strategy() == MigrationStrategy::Recreate {
                log::warn!("dropping stored config with version '{}'", stale.version);
                let _ = storage.remove_item(STORAGE_KEY);
            }
            AppConfig::default()
        }
        Err(err) => {
            log::warn!("ignoring stored config override: {err}");
            AppConfig::default()
        }
    }
}

/// Persists the last launched profile as the next default.
pub fn remember_profile(config: &mut AppConfig, profile: MachineProfile) {
    if config.session.default_profile == profile {
        return;
    }
    config.session.default_profile = profile;
    let text = match config.to_toml() {
        Ok(text) => text,
        Err(err) => {
            log::warn!("config not saved: {err}");
            return;
        }
    };
    if let Some(storage) = storage() {
        if storage.set_item(STORAGE_KEY, &text).is_err() {
            log::warn!("config not saved: storage rejected the write");
        }
    }
}
