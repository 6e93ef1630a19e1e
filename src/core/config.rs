//! Configuration management for sitedeploy
//!
//! Supports environment variables, an optional config file, and CLI
//! overrides. FTP credentials are not part of these settings; they live in
//! the flat credentials file read by [`crate::deploy::credentials`].
//!
//! Config file location: ~/.config/sitedeploy/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{DeployError, Result};

/// Main configuration for sitedeploy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Upload source and target
    #[serde(default)]
    pub upload: UploadConfig,
    /// FTP connection configuration
    #[serde(default)]
    pub ftp: FtpConfig,
    /// Smoke-check configuration
    #[serde(default)]
    pub smoke: SmokeConfig,
}

/// What gets uploaded where
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Local build output directory (default: dist)
    pub local_dir: PathBuf,
    /// Remote directory the build is mirrored into
    pub remote_dir: String,
    /// Flat key=value file holding the FTP credentials
    pub env_file: PathBuf,
    /// Delete the remote file when its transfer fails
    pub cleanup_partial: bool,
}

/// FTP connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    /// Control connection port, used when the credentials file has none
    pub port: u16,
    /// Timeout in seconds for the connect and for each read or write on the
    /// control connection
    pub connect_timeout_secs: u64,
}

/// Browser smoke-check settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    /// Page to load
    pub url: String,
    /// CSS selector that must appear
    pub selector: String,
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Navigation timeout in ms
    pub navigation_timeout_ms: u64,
    /// Selector wait timeout in ms
    pub selector_timeout_ms: u64,
    /// Screenshot written when the selector is found
    pub success_screenshot: PathBuf,
    /// Screenshot written when the check fails
    pub error_screenshot: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            local_dir: env::var("SITEDEPLOY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("dist")),
            remote_dir: env::var("SITEDEPLOY_REMOTE_DIR")
                .unwrap_or_else(|_| "/public_html".to_string()),
            env_file: env::var("SITEDEPLOY_ENV_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".env")),
            cleanup_partial: true,
        }
    }
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            port: 21,
            connect_timeout_secs: env::var("SITEDEPLOY_CONNECT_TIMEOUT")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            url: env::var("SMOKE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            selector: env::var("SMOKE_SELECTOR").unwrap_or_else(|_| ".min-h-screen".to_string()),
            session_name: "sitedeploy-smoke".to_string(),
            headed: env::var("SMOKE_HEADED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            navigation_timeout_ms: 30_000,
            selector_timeout_ms: 10_000,
            success_screenshot: PathBuf::from("smoke-success.png"),
            error_screenshot: PathBuf::from("smoke-error.png"),
        }
    }
}

impl Settings {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sitedeploy")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Result<Self> {
        // Pick up SITEDEPLOY_* / SMOKE_* from a .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = Self::config_file();
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|e| DeployError::config(format!("Failed to read config: {}", e)))?;
            return Self::from_toml(&content);
        }

        Ok(Self::default())
    }

    /// Parse settings from TOML; missing sections fall back to defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DeployError::config(format!("Failed to parse config: {}", e)))
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DeployError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Check that the smoke URL is a usable http(s) URL
    pub fn validate_smoke_url(&self) -> Result<url::Url> {
        let url = url::Url::parse(&self.smoke.url)
            .map_err(|e| DeployError::config(format!("Invalid smoke URL '{}': {}", self.smoke.url, e)))?;

        match url.scheme() {
            "http" | "https" | "file" => Ok(url),
            other => Err(DeployError::config(format!(
                "Unsupported smoke URL scheme '{}'",
                other
            ))),
        }
    }
}

impl FtpConfig {
    /// Control connection timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl SmokeConfig {
    /// Navigation timeout as a duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Selector wait timeout as a duration
    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }
}
