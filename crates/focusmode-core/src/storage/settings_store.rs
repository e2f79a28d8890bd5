//! Get/set boundary for timer settings.

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::storage::Config;
use crate::timer::TimerSettings;

/// Where a host keeps its [`TimerSettings`].
///
/// Errors use [`crate::CoreError`] so stores backed by other formats or
/// services can report their own failures.
pub trait SettingsStore {
    fn load(&self) -> Result<TimerSettings>;
    fn save(&mut self, settings: &TimerSettings) -> Result<()>;
}

/// Settings held in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: TimerSettings,
}

impl MemorySettingsStore {
    pub fn new(settings: TimerSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<TimerSettings> {
        Ok(self.settings)
    }

    fn save(&mut self, settings: &TimerSettings) -> Result<()> {
        self.settings = *settings;
        Ok(())
    }
}

/// Settings kept in the `[timer]` table of a config file.
///
/// Saving rewrites only that table; other sections are preserved.
#[derive(Debug, Clone)]
pub struct ConfigSettingsStore {
    path: PathBuf,
}

impl ConfigSettingsStore {
    /// Store backed by the config file in the default data directory.
    pub fn open() -> Result<Self, ConfigError> {
        Ok(Self {
            path: super::data_dir()?.join("config.toml"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for ConfigSettingsStore {
    fn load(&self) -> Result<TimerSettings> {
        Ok(Config::load_from(&self.path)?.timer)
    }

    fn save(&mut self, settings: &TimerSettings) -> Result<()> {
        let mut config = Config::load_from(&self.path)?;
        config.timer = settings.clamped();
        config.save_to(&self.path)?;
        Ok(())
    }
}
