//! Unified path management for register configuration and data files.
//!
//! All configuration lives under the platform config directory and the
//! shared state store under the platform data directory, so two register
//! windows on the same machine resolve the same files.
//!
//! ```text
//! ~/.config/tillsync/          # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/tillsync/     # Data directory
//! └── till-store.json          # Shared state store
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for till_core::TillError {
    fn from(e: PathError) -> Self {
        till_core::TillError::config(e.to_string())
    }
}

const APP_DIR: &str = "tillsync";

/// Unified path management for the register.
pub struct TillPaths;

impl TillPaths {
    /// Returns the configuration directory (e.g., `~/.config/tillsync/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g., `~/.local/share/tillsync/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the shared state store file.
    pub fn store_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("till-store.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = TillPaths::config_dir().unwrap();
        assert!(config_dir.ends_with("tillsync"));
    }

    #[test]
    fn test_config_file() {
        let config_file = TillPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        let config_dir = TillPaths::config_dir().unwrap();
        assert!(config_file.starts_with(&config_dir));
    }

    #[test]
    fn test_store_file() {
        let store_file = TillPaths::store_file().unwrap();
        assert!(store_file.ends_with("till-store.json"));
        let data_dir = TillPaths::data_dir().unwrap();
        assert!(store_file.starts_with(&data_dir));
    }
}
