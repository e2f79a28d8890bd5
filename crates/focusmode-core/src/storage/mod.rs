mod config;
mod settings_store;

pub use config::{Config, NotificationsConfig};
pub use settings_store::{ConfigSettingsStore, MemorySettingsStore, SettingsStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the configuration directory, creating it if needed.
///
/// `FOCUSMODE_CONFIG_DIR` overrides the location outright. Otherwise it is
/// `~/.config/focusmode[-dev]/`, with `FOCUSMODE_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if no directory can be determined or created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSMODE_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir().ok_or(ConfigError::NoDataDir)?.join(".config");
            let env = std::env::var("FOCUSMODE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusmode-dev")
            } else {
                base_dir.join("focusmode")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
