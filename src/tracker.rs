//! Search-and-export loop
//!
//! Walks each identifier through a small state machine against the keyword
//! tracker page: Searching → {Found, NotFound} → (if Found) Exporting →
//! Exported. One identifier failing never aborts the run; only a missing
//! search box skips an identifier, and every other transient lookup failure is
//! absorbed with a fixed fallback delay.

use std::io::Write;
use std::time::Duration;

use fantoccini::key::Key;
use tracing::{info, warn};

use crate::browser::locate::{click_first, settle, wait_for_any};
use crate::browser::{DownloadWatcher, Session, SEARCH_BOX_SELECTORS};
use crate::core::{Config, ExportResult, Result, SearchOutcome, StatusEvent, StatusRecord};
use crate::report::Reporter;
use crate::sheets::RowSink;

/// Candidate selectors for the export dropdown trigger on an expanded row
const EXPORT_BUTTON_SELECTORS: &[&str] = &[
    "button.btn.btn-success.btn-sm.dropdown-toggle",
    ".kt-keywords-actions button.dropdown-toggle",
    "button.dropdown-toggle.btn-success",
];

/// Candidate selectors for the "current result" action inside the dropdown
const CURRENT_RESULT_SELECTORS: &[&str] = &[
    "a.dropdown-item.action-export-cur-res",
    ".dropdown-menu a.dropdown-item",
];

/// Selector for the expanded keyword detail under a clicked result row
const EXPANDED_ROW_SELECTOR: &str = "tr.kt-keywords-row:not(.hide)";

/// How long a result row gets to appear before an identifier is NotFound
const RESULT_PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// How long a triggered export download may take
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Run the search-and-export loop over all identifiers in order
pub async fn run<S, W>(
    session: &Session,
    sink: &S,
    reporter: &Reporter<W>,
    config: &Config,
    identifiers: &[String],
) -> Result<()>
where
    S: RowSink + ?Sized,
    W: Write,
{
    for identifier in identifiers {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            continue;
        }

        let outcome = match search(session, config, identifier).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Search box unreachable: report and move on
                reporter.emit(&StatusEvent::asin_error(identifier, e.to_string()))?;
                SearchOutcome::Error
            }
        };

        match outcome {
            SearchOutcome::NotFound => {
                info!(identifier, "no matching result row");
                reporter.emit(&StatusEvent::NotFound {
                    asin: identifier.to_string(),
                })?;
                record_outcome(sink, reporter, identifier, outcome).await?;
                settle(1000).await;
            }
            SearchOutcome::Found => match export(session, config, identifier).await {
                Ok(export) => {
                    reporter.emit(&StatusEvent::Ok {
                        asin: identifier.to_string(),
                        final_url: session.current_url_lossy().await,
                        download_path: export.path.display().to_string(),
                        profile_dir: config.browser.profile_dir.display().to_string(),
                    })?;
                    record_outcome(sink, reporter, identifier, outcome).await?;
                    settle(800).await;
                }
                Err(e) => {
                    warn!(identifier, "export failed: {}", e);
                    reporter.emit(&StatusEvent::asin_error(identifier, e.to_string()))?;
                    settle(1000).await;
                }
            },
            SearchOutcome::Error => {
                settle(1000).await;
            }
        }
    }

    Ok(())
}

/// Type an identifier into the search box and probe for a result row
async fn search(session: &Session, config: &Config, identifier: &str) -> Result<SearchOutcome> {
    let client = session.client();

    let search_box = wait_for_any(client, SEARCH_BOX_SELECTORS, Duration::from_secs(10))
        .await
        .map_err(|e| {
            warn!(identifier, "search box lookup failed: {}", e);
            crate::core::TrackexError::browser("Search box not visible")
        })?;

    // Clear any previous query with a platform-aware select-all, then type
    search_box.click().await?;
    search_box.send_keys(&select_all_chord()).await?;
    search_box.send_keys(&key_press(Key::Backspace)).await?;
    search_box.send_keys(identifier).await?;
    search_box.send_keys(&key_press(Key::Enter)).await?;

    // Let the table refresh before probing
    settle(3000).await;

    let row_selector: &[&str] = &[config.tracker.result_row_selector.as_str()];
    match wait_for_any(client, row_selector, RESULT_PROBE_TIMEOUT).await {
        Ok(_) => Ok(SearchOutcome::Found),
        Err(_) => Ok(SearchOutcome::NotFound),
    }
}

/// Expand the first result row and download its "current result" export
async fn export(session: &Session, config: &Config, identifier: &str) -> Result<ExportResult> {
    let client = session.client();
    settle(1000).await;

    let row_selector: &[&str] = &[config.tracker.result_row_selector.as_str()];
    let row = wait_for_any(client, row_selector, Duration::from_secs(10)).await?;

    settle(1000).await;
    // Best-effort scroll; a click scrolls the element into view anyway
    if let Ok(element_arg) = serde_json::to_value(&row) {
        let _ = client
            .execute("arguments[0].scrollIntoView({block: 'center'})", vec![element_arg])
            .await;
    }
    settle(200).await;
    row.click().await?;
    // Let the expand animation run
    settle(500).await;

    if wait_for_any(client, &[EXPANDED_ROW_SELECTOR], Duration::from_secs(10))
        .await
        .is_err()
    {
        settle(500).await;
    }

    // The export button going visible is the reliable signal the row is open
    if wait_for_any(client, EXPORT_BUTTON_SELECTORS, Duration::from_secs(10))
        .await
        .is_err()
    {
        settle(300).await;
    }
    click_first(client, EXPORT_BUTTON_SELECTORS).await?;
    // Let the dropdown mount
    settle(300).await;

    if wait_for_any(client, CURRENT_RESULT_SELECTORS, Duration::from_secs(10))
        .await
        .is_err()
    {
        settle(200).await;
    }

    let watcher = DownloadWatcher::begin(&config.browser.download_dir)?;
    click_first(client, CURRENT_RESULT_SELECTORS).await?;
    let path = watcher.wait_for_file(DOWNLOAD_TIMEOUT).await?;

    info!(identifier, path = %path.display(), "export saved");
    Ok(ExportResult {
        identifier: identifier.to_string(),
        path,
    })
}

/// Append the spreadsheet row for an outcome, if it has one.
///
/// A sink failure is reported per-identifier and absorbed; the loop keeps
/// going either way.
pub async fn record_outcome<S, W>(
    sink: &S,
    reporter: &Reporter<W>,
    identifier: &str,
    outcome: SearchOutcome,
) -> Result<Option<StatusRecord>>
where
    S: RowSink + ?Sized,
    W: Write,
{
    let Some(label) = outcome.label() else {
        return Ok(None);
    };

    let record = StatusRecord::new(identifier, label);
    match sink.append_row(&record).await {
        Ok(()) => Ok(Some(record)),
        Err(e) => {
            warn!(identifier, "sheet append failed: {}", e);
            reporter.emit(&StatusEvent::asin_error(
                identifier,
                format!("Sheet append failed: {}", e),
            ))?;
            Ok(None)
        }
    }
}

/// Modifier+A chord for clearing the search box (Meta on macOS, Control elsewhere)
fn select_all_chord() -> String {
    let modifier = if cfg!(target_os = "macos") {
        Key::Meta
    } else {
        Key::Control
    };
    let mut chord = String::new();
    chord.push(char::from(modifier));
    chord.push('a');
    chord
}

fn key_press(key: Key) -> String {
    char::from(key).to_string()
}
