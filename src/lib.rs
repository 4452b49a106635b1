//! trackex - Keyword-tracker search and export automation
//!
//! Signs in to a keyword-tracking dashboard in a headed Chrome session,
//! searches a list of product identifiers (ASINs), downloads an export for
//! each match, and appends one status row per identifier to a Google Sheet.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Input**: Identifier list parsing (JSON array or delimited text)
//! - **Browser**: chromedriver session, selector fallback chains, wait
//!   primitives, and download capture
//! - **Tracker**: The per-identifier search-and-export state machine
//! - **Sheets**: Append-only status rows via a service account
//! - **Report**: NDJSON status events on stdout

pub mod browser;
pub mod core;
pub mod input;
pub mod report;
pub mod sheets;
pub mod tracker;

// Re-export commonly used items
pub use browser::Session;
pub use crate::core::{Config, Result, SearchOutcome, StatusEvent, TrackexError};
pub use report::Reporter;
pub use sheets::{RowSink, SheetsClient};
