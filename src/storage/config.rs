//! Application configuration.
//!
//! Stored as TOML in the platform data directory; a missing file means
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::{AuthError, FederatedProvider};

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "gymanager.db";

/// Default nonce length for federated sign-in.
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Record store settings
    pub store: StoreSettings,
    /// Sign-in settings
    pub auth: AuthSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            store: StoreSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl AppConfig {
    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.store.database_file)
    }
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Database file name, relative to the data directory
    pub database_file: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

/// Sign-in settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// OAuth client ID for Google sign-in; Google is unavailable without it
    pub google_client_id: Option<String>,
    /// Whether Sign in with Apple is offered
    pub apple_sign_in: bool,
    /// Length of the raw nonce sent with federated sign-in
    pub nonce_length: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            google_client_id: None,
            apple_sign_in: true,
            nonce_length: DEFAULT_NONCE_LENGTH,
        }
    }
}

impl AuthSettings {
    /// Check that a federated provider can be used with these settings.
    pub fn ensure_configured(&self, provider: FederatedProvider) -> Result<(), AuthError> {
        match provider {
            FederatedProvider::Google => match self.google_client_id.as_deref() {
                Some(id) if !id.trim().is_empty() => Ok(()),
                _ => Err(AuthError::ProviderUnavailable(
                    "Google client ID is not configured".to_string(),
                )),
            },
            FederatedProvider::Apple if self.apple_sign_in => Ok(()),
            FederatedProvider::Apple => Err(AuthError::ProviderUnavailable(
                "Sign in with Apple is disabled".to_string(),
            )),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "gymanager", "GYManager")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from a file.
///
/// The data directory is the directory holding the file.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if !path.exists() {
        let config = AppConfig {
            data_dir,
            ..Default::default()
        };
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to a file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
