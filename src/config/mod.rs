//! Configuration Module
//!
//! Handles console configuration loading, validation, and management.

pub mod secrets;

pub use secrets::SecretString;

use crate::api::DEFAULT_BASE_URL;
use crate::i18n::Locale;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote gateway API
    #[serde(default)]
    pub api: ApiConfig,

    /// Console server and interactive views
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Where the credential and settings draft are kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote gateway API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL (default: "https://api.zuckzapgo.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// "production" or "development". Development enables the console
    /// server's same-origin `/api` rewrite.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Per-request timeout; unset means the HTTP stack defaults
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            environment: default_environment(),
            request_timeout_secs: None,
        }
    }
}

impl ApiConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Console server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Bind address (default: "127.0.0.1")
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Locale for messages and unprefixed URLs (default: "pt")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Lifetime of the auth cookie pair (default: 7 days)
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_secs: u64,

    /// Session status poll interval (default: 30)
    #[serde(default = "default_interval")]
    pub status_poll_secs: u64,

    /// QR code refresh interval while pairing (default: 30)
    #[serde(default = "default_interval")]
    pub qr_refresh_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_locale() -> String {
    Locale::default().as_str().to_string()
}

fn default_cookie_max_age() -> u64 {
    crate::auth::cookies::DEFAULT_MAX_AGE_SECS
}

fn default_interval() -> u64 {
    30
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            locale: default_locale(),
            cookie_max_age_secs: default_cookie_max_age(),
            status_poll_secs: default_interval(),
            qr_refresh_secs: default_interval(),
        }
    }
}

impl ConsoleConfig {
    pub fn locale(&self) -> Locale {
        self.locale.parse().unwrap_or_default()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs)
    }

    pub fn qr_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.qr_refresh_secs)
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" or "keyring" (default: "file")
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Directory for the file backend
    #[serde(default = "crate::storage::default_dir")]
    pub dir: PathBuf,
}

fn default_backend() -> String {
    "file".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            dir: crate::storage::default_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file path
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/zapconsole/config.toml
    /// 3. Local config: ./zapconsole.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::merge_from_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::merge_from_file(&local_config_path)?;
        }

        config = Self::apply_env_overrides(config);

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, which must exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::merge_from_file(path)?;

        Ok(Self::apply_env_overrides(config))
    }

    /// Get the system config path: ~/.config/zapconsole/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zapconsole").join("config.toml"))
    }

    /// Get the local config path: ./zapconsole.toml
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("./zapconsole.toml")
    }

    /// A later file replaces whole sections it names; sections it omits
    /// fall back to defaults.
    fn merge_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn apply_env_overrides(config: Self) -> Self {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Apply `ZAPCONSOLE_*` overrides read through `lookup`.
    fn apply_overrides_from(mut config: Self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("ZAPCONSOLE_API_URL").or_else(|| lookup("NEXT_PUBLIC_API_URL")) {
            config.api.base_url = url;
        }

        if let Some(environment) = lookup("ZAPCONSOLE_ENV") {
            config.api.environment = environment;
        }

        if let Some(locale) = lookup("ZAPCONSOLE_LOCALE") {
            config.console.locale = locale;
        }

        if let Some(dir) = lookup("ZAPCONSOLE_STORAGE_DIR") {
            config.storage.dir = PathBuf::from(dir);
        }

        if let Some(backend) = lookup("ZAPCONSOLE_STORAGE_BACKEND") {
            config.storage.backend = backend;
        }

        if let Some(level) = lookup("ZAPCONSOLE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = lookup("ZAPCONSOLE_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        if let Some(bind) = lookup("ZAPCONSOLE_BIND") {
            config.console.bind = bind;
        }

        if let Some(port) = lookup("ZAPCONSOLE_PORT") {
            match port.parse() {
                Ok(port) => config.console.port = port,
                Err(_) => tracing::warn!("Ignoring invalid ZAPCONSOLE_PORT: {}", port),
            }
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        let url = reqwest::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must be http or https: {}", self.api.base_url);
        }

        let environments = ["production", "development"];
        if !environments.contains(&self.api.environment.as_str()) {
            anyhow::bail!(
                "Invalid environment: {}. Must be one of: {:?}",
                self.api.environment,
                environments
            );
        }

        self.console
            .locale
            .parse::<Locale>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let backends = ["file", "keyring"];
        if !backends.contains(&self.storage.backend.as_str()) {
            anyhow::bail!(
                "Invalid storage backend: {}. Must be one of: {:?}",
                self.storage.backend,
                backends
            );
        }

        if self.console.status_poll_secs == 0 || self.console.qr_refresh_secs == 0 {
            anyhow::bail!("Poll intervals must be at least one second");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.zuckzapgo.com");
        assert_eq!(config.api.environment, "production");
        assert!(config.api.request_timeout().is_none());
        assert_eq!(config.console.port, 3000);
        assert_eq!(config.console.locale(), Locale::Pt);
        assert_eq!(config.console.cookie_max_age_secs, 604800);
        assert_eq!(config.storage.backend, "file");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.environment = "staging".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.console.locale = "fr".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.backend = "s3".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.console.status_poll_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
[api]
base_url = "http://localhost:8080"
environment = "development"
request_timeout_secs = 15

[console]
port = 8081
locale = "en"

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert!(config.api.is_development());
        assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.console.port, 8081);
        assert_eq!(config.console.bind, "127.0.0.1");
        assert_eq!(config.console.locale(), Locale::En);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.backend, "file");
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.console.port = 4000;

        config.save(temp_file.path()).unwrap();
        let loaded = Config::merge_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded.console.port, 4000);
        assert_eq!(loaded.api.base_url, config.api.base_url);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/zapconsole.toml");
        Config::default().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        assert!(Config::load_from_path("/nonexistent/zapconsole.toml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NEXT_PUBLIC_API_URL", "http://legacy:1"),
            ("ZAPCONSOLE_API_URL", "http://gateway:9000"),
            ("ZAPCONSOLE_ENV", "development"),
            ("ZAPCONSOLE_PORT", "not-a-port"),
            ("ZAPCONSOLE_STORAGE_BACKEND", "keyring"),
        ]
        .into_iter()
        .collect();

        let config = Config::apply_overrides_from(Config::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.api.base_url, "http://gateway:9000");
        assert!(config.api.is_development());
        assert_eq!(config.console.port, 3000);
        assert_eq!(config.storage.backend, "keyring");
    }

    #[test]
    fn test_socket_addr() {
        let mut console = ConsoleConfig::default();
        assert_eq!(console.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
        console.bind = "localhost".to_string();
        assert!(console.socket_addr().is_err());
    }
}
