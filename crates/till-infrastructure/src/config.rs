//! Configuration service.
//!
//! Loads the register configuration from `~/.config/tillsync/config.toml`
//! and caches it to avoid repeated file I/O.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use till_core::error::{Result, TillError};
use till_core::session::DeviceProfile;

use crate::paths::TillPaths;

/// Root register configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Name printed on receipts and shown on the customer display.
    pub company_name: String,
    /// Device profile applied to sessions opened on this register.
    pub device: DeviceProfile,
    /// Reconciliation interval for display watchers, in seconds.
    pub poll_interval_secs: u64,
    /// Override for the shared store location. `None` uses the platform
    /// data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            company_name: "Company Name".to_string(),
            device: DeviceProfile::default(),
            poll_interval_secs: 5,
            data_dir: None,
        }
    }
}

impl RegisterConfig {
    /// Resolves the shared state store file, honoring `data_dir`.
    pub fn store_file(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.join("till-store.json")),
            None => Ok(TillPaths::store_file()?),
        }
    }
}

/// Loads and caches the register configuration.
///
/// The configuration is loaded lazily on first access; a missing file
/// yields defaults and writes them back so the operator has something to
/// edit.
#[derive(Debug, Clone)]
pub struct ConfigService {
    config: Arc<RwLock<Option<RegisterConfig>>>,
    path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Result<Self> {
        Ok(Self::at(TillPaths::config_file()?))
    }

    /// Uses an explicit config file path (tests, portable installs).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: path.into(),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<RegisterConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| TillError::internal(format!("config lock poisoned: {e}")))?;
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let loaded = Self::load(&self.path)?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|e| TillError::internal(format!("config lock poisoned: {e}")))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load(path: &Path) -> Result<RegisterConfig> {
        if !path.exists() {
            let default_config = RegisterConfig::default();
            Self::save_default(path, &default_config);
            return Ok(default_config);
        }

        let raw = std::fs::read_to_string(path)?;
        let config: RegisterConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    // Best-effort; failing to seed the file is not fatal, the defaults
    // still apply in memory.
    fn save_default(path: &Path, config: &RegisterConfig) {
        let Ok(serialized) = toml::to_string_pretty(config) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        if let Err(e) = std::fs::write(path, serialized) {
            tracing::warn!(path = %path.display(), error = %e, "could not seed default config");
        }
    }
}
