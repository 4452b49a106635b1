//! Shared types used across trackex modules
//!
//! Contains the per-identifier outcome model and the NDJSON status events
//! emitted on stdout.

use serde::Serialize;
use std::path::PathBuf;

/// Outcome of searching the tracker for one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A matching result row appeared
    Found,
    /// No result row within the probe deadline
    NotFound,
    /// The identifier could not be searched at all
    Error,
}

impl SearchOutcome {
    /// Spreadsheet label for this outcome, if one should be recorded.
    ///
    /// `Error` outcomes are reported on stdout but produce no sheet row.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            SearchOutcome::Found => Some("Success"),
            SearchOutcome::NotFound => Some("Not Found"),
            SearchOutcome::Error => None,
        }
    }
}

/// A downloaded export artifact tied to one identifier
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Identifier the export belongs to
    pub identifier: String,
    /// Where the browser saved the file
    pub path: PathBuf,
}

/// One append-only row for the external spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub identifier: String,
    pub label: String,
}

impl StatusRecord {
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
        }
    }
}

/// Status events emitted as newline-delimited JSON on stdout
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Fatal or per-identifier failure
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        asin: Option<String>,
        message: String,
    },

    /// Login was redirected to the two-factor challenge page
    #[serde(rename = "2fa_required")]
    TwoFactorRequired { message: String },

    /// Dashboard did not appear within the configured deadline
    Timeout {
        final_url: String,
        profile_dir: String,
    },

    /// No result row matched the identifier
    NotFound { asin: String },

    /// Export downloaded successfully
    Ok {
        asin: String,
        final_url: String,
        download_path: String,
        profile_dir: String,
    },
}

impl StatusEvent {
    /// Fatal error with no identifier attached
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Error {
            asin: None,
            message: message.into(),
        }
    }

    /// Per-identifier error
    pub fn asin_error(asin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            asin: Some(asin.into()),
            message: message.into(),
        }
    }
}
