//! Configuration management for trackex
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/trackex/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, TrackexError};

/// Main configuration for trackex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dashboard login credentials
    pub credentials: CredentialsConfig,
    /// Browser and WebDriver configuration
    pub browser: BrowserConfig,
    /// Tracker site URLs, selectors, and timeouts
    pub tracker: TrackerConfig,
    /// Google Sheets status log
    pub sheet: SheetConfig,
}

/// Dashboard account credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Account email for the sign-in form
    pub email: String,
    /// Account password for the sign-in form
    pub password: String,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Persistent Chrome profile directory (cookies survive across runs)
    pub profile_dir: PathBuf,
    /// Directory where export downloads are saved
    pub download_dir: PathBuf,
    /// Port the spawned chromedriver listens on
    pub driver_port: u16,
    /// Run with a visible window. The 2FA step needs a human at the keyboard,
    /// so this defaults to true.
    pub headed: bool,
}

/// Tracker site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Sign-in page URL
    pub signin_url: String,
    /// URL path fragment of the two-factor challenge page
    pub code_required_path: String,
    /// Keyword tracker page URL
    pub tracker_url: String,
    /// URL fragment that marks a successful login landing
    pub dashboard_fragment: String,
    /// How long to wait for the dashboard after login/2FA, in seconds
    pub dashboard_timeout_secs: u64,
    /// CSS selector for a result row in the tracker table
    pub result_row_selector: String,
}

/// Google Sheets sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Path to the service-account JSON key file
    pub creds_path: PathBuf,
    /// Name of the spreadsheet to append to (resolved via the Drive API)
    pub sheet_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: CredentialsConfig::default(),
            browser: BrowserConfig::default(),
            tracker: TrackerConfig::default(),
            sheet: SheetConfig::default(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email: env::var("TRACKEX_EMAIL").unwrap_or_default(),
            password: env::var("TRACKEX_PASSWORD").unwrap_or_default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackex");
        Self {
            profile_dir: env::var("TRACKEX_PROFILE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("profile")),
            download_dir: env::var("TRACKEX_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("downloads")),
            driver_port: env::var("TRACKEX_DRIVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(9515),
            headed: env::var("TRACKEX_HEADED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            signin_url: "https://members.helium10.com/user/signin".to_string(),
            code_required_path: "/user/code-required".to_string(),
            tracker_url: "https://members.helium10.com/keyword-tracker".to_string(),
            dashboard_fragment: "dashboard".to_string(),
            dashboard_timeout_secs: env::var("TRACKEX_DASHBOARD_TIMEOUT")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(180),
            result_row_selector: "tr.kt-orders-row".to_string(),
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            creds_path: env::var("TRACKEX_SHEET_CREDS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("service-account.json")),
            sheet_name: env::var("TRACKEX_SHEET_NAME").unwrap_or_default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackex")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(TrackexError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| TrackexError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| TrackexError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| TrackexError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TrackexError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| TrackexError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Local address of the spawned chromedriver
    pub fn webdriver_url(&self) -> String {
        format!("http://localhost:{}", self.browser.driver_port)
    }

    /// Validate the fields the pipeline cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.credentials.email.is_empty() || self.credentials.password.is_empty() {
            return Err(TrackexError::config(
                "Missing credentials: set TRACKEX_EMAIL and TRACKEX_PASSWORD or fill the config file",
            ));
        }
        if self.sheet.sheet_name.is_empty() {
            return Err(TrackexError::config(
                "Missing sheet name: set TRACKEX_SHEET_NAME or fill the config file",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.browser.driver_port, 9515);
        assert!(config.browser.headed);
        assert_eq!(config.tracker.dashboard_timeout_secs, 180);
        assert_eq!(config.tracker.result_row_selector, "tr.kt-orders-row");
        assert!(config.tracker.signin_url.contains("signin"));
    }

    #[test]
    fn test_webdriver_url() {
        let config = Config::default();
        assert_eq!(config.webdriver_url(), "http://localhost:9515");
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tracker.signin_url, config.tracker.signin_url);
        assert_eq!(parsed.browser.driver_port, config.browser.driver_port);
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("trackex"));
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let mut config = Config::default();
        config.credentials.email = String::new();
        config.credentials.password = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_filled_config() {
        let mut config = Config::default();
        config.credentials.email = "user@example.com".to_string();
        config.credentials.password = "hunter2".to_string();
        config.sheet.sheet_name = "ASIN Status".to_string();
        assert!(config.validate().is_ok());
    }
}
