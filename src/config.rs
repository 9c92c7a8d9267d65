use std::env;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::controller::{SyncSettings, DEFAULT_STALE_AFTER, DEFAULT_SYNC_DELAY};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Where the repository list is kept. Defaults to the user data dir.
    pub store_path: Option<PathBuf>,
    pub sync_delay_ms: u64,
    // A pending repository older than this may be synced again.
    pub stale_pending_secs: u64,
    pub watch_poll_ms: u64,
    /// Force plain (true) or fancy (false) symbols. Unset means auto-detect.
    pub plain_text: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            sync_delay_ms: DEFAULT_SYNC_DELAY.as_millis() as u64,
            stale_pending_secs: DEFAULT_STALE_AFTER.as_secs(),
            watch_poll_ms: 1000,
            plain_text: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::get_config_home()?.join("config.toml"))
    }

    /// Location of all config. By default
    ///
    /// Linux   :   $XDG_CONFIG_HOME/repodash or $HOME/.config/repodash
    /// macOS   :   $HOME/Library/Application Support/repodash
    /// Windows :   %AppData%\Roaming\repodash
    ///
    /// This can be overridden by setting the REPODASH_CONFIG_HOME environment variable.
    fn get_config_home() -> Result<PathBuf> {
        if let Ok(env_var) = env::var("REPODASH_CONFIG_HOME") {
            if !env_var.is_empty() {
                return Ok(env_var.into());
            }
        }

        dirs::config_dir()
            .map(|dir| dir.join("repodash"))
            .ok_or_else(|| {
                anyhow!(
                    "Could not find your config directory. Set REPODASH_CONFIG_HOME to choose one."
                )
            })
    }

    /// Load Config from the default path, falling back to defaults.
    pub fn load() -> Self {
        Self::default_path()
            .and_then(|path| Self::load_file(&path))
            .unwrap_or_default()
    }

    /// Load the config a command should use, along with the file it belongs to.
    /// An explicit path must exist and parse; the default path falls back to
    /// defaults. The path is `None` only when no config directory can be found.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match explicit {
            Some(path) => Ok((Self::load_file(path)?, Some(path.to_path_buf()))),
            None => match Self::default_path() {
                Ok(path) => {
                    let config = Self::load_file(&path).unwrap_or_default();
                    Ok((config, Some(path)))
                }
                Err(_) => Ok((Self::default(), None)),
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Unable to read config at {}", path.display()))?;
        let res = toml::from_str(&text)
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        Ok(res)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::default_path()?)
    }

    /// Attempts to create parent dirs, serialize `self` as TOML and write to disk.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            create_dir_all(dir)
                .with_context(|| format!("Failed to create directory at `{}`", dir.display()))?;
        }

        let config_string = toml::to_string(self).context("Unable to serialize config")?;
        fs::write(path, config_string)
            .with_context(|| format!("Unable to write config file {}", path.display()))?;
        Ok(())
    }

    /// The configured store file, or `<data dir>/repodash/repositories.json`.
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("repodash").join("repositories.json"))
            .ok_or_else(|| anyhow!("Could not find a data directory. Set store_path in the config."))
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            delay: Duration::from_millis(self.sync_delay_ms),
            stale_after: Duration::from_secs(self.stale_pending_secs),
        }
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_poll_ms.max(50))
    }
}
