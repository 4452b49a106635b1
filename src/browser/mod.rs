//! Browser automation module
//!
//! Drives a headed Chrome session through chromedriver via fantoccini.

pub mod download;
pub mod locate;
mod session;

pub use download::DownloadWatcher;
pub use session::{Session, SEARCH_BOX_SELECTORS};
