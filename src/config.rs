//! Configuration module for qrshare.

use serde::Deserialize;
use std::path::Path;

use crate::{QrShareError, Result};

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the upload directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl FilesConfig {
    /// Maximum upload size in bytes, saturating at `u64::MAX`.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/qrshare.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Public base URL used in download links (e.g. "https://share.example.com").
    ///
    /// When empty, the base URL is derived from the request's Host header.
    #[serde(default)]
    pub public_url: String,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve static files under /static.
    #[serde(default)]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
    /// Uploads allowed per minute per client IP (0 disables the limit).
    #[serde(default = "default_upload_rate_limit")]
    pub upload_rate_limit: u32,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    5000
}

fn default_static_path() -> String {
    "static".to_string()
}

fn default_upload_rate_limit() -> u32 {
    30
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            public_url: String::new(),
            cors_origins: vec![],
            serve_static: false,
            static_path: default_static_path(),
            upload_rate_limit: default_upload_rate_limit(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(QrShareError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| QrShareError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `QRSHARE_PUBLIC_URL`: Override the public base URL
    /// - `QRSHARE_STORAGE_PATH`: Override the upload directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(public_url) = std::env::var("QRSHARE_PUBLIC_URL") {
            if !public_url.is_empty() {
                self.web.public_url = public_url;
            }
        }

        if let Ok(storage_path) = std::env::var("QRSHARE_STORAGE_PATH") {
            if !storage_path.is_empty() {
                self.files.storage_path = storage_path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - `public_url` is set but is not an absolute http(s) URL
    /// - `max_upload_size_mb` is zero
    pub fn validate(&self) -> Result<()> {
        if !self.web.public_url.is_empty() {
            let parsed = url::Url::parse(&self.web.public_url).map_err(|e| {
                QrShareError::Config(format!("invalid public_url '{}': {e}", self.web.public_url))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(QrShareError::Config(format!(
                    "public_url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        if self.files.max_upload_size_mb == 0 {
            return Err(QrShareError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
