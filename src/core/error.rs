//! Custom error types for trackex
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for trackex operations
#[derive(Error, Debug)]
pub enum TrackexError {
    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// Every candidate selector in a fallback chain failed
    #[error("No selector matched (tried: {})", attempted.join(", "))]
    Selector {
        attempted: Vec<String>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Google Sheets sink errors
    #[error("Sheet error: {0}")]
    Sheet(String),

    /// No downloaded file appeared within the deadline
    #[error("Download did not complete within {0} seconds")]
    DownloadTimeout(u64),

    /// WebDriver command errors
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// WebDriver session creation errors
    #[error("WebDriver session error: {0}")]
    NewSession(#[from] fantoccini::error::NewSessionError),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// chromedriver binary not found on PATH
    #[error("chromedriver not found. Install it and ensure it is on PATH")]
    DriverNotFound,

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for trackex operations
pub type Result<T> = std::result::Result<T, TrackexError>;

impl TrackexError {
    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a sheet error
    pub fn sheet(msg: impl Into<String>) -> Self {
        Self::Sheet(msg.into())
    }

    /// Create a selector-exhaustion error from the attempted chain
    pub fn selector<E>(attempted: &[&str], last: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Selector {
            attempted: attempted.iter().map(|s| s.to_string()).collect(),
            source: Box::new(last),
        }
    }
}
