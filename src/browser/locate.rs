//! Element lookup and wait primitives
//!
//! The tracker page is an uncontrolled third-party SPA, so every lookup goes
//! through an ordered fallback chain of candidate CSS selectors, evaluated in
//! sequence with early exit on the first match. A chain that exhausts all
//! candidates surfaces a single `Selector` error carrying everything that was
//! tried. Waiting is a small set of named primitives rather than ad hoc sleeps.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::core::{Result, TrackexError};

/// Overall budget for the chains behind `fill_first` and `click_first`
const CHAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait until any candidate selector matches a visible element, returning it.
///
/// Candidates are polled round-robin under one shared deadline, so a chain
/// costs at most `timeout` however long it is. An element that is present but
/// hidden does not satisfy the wait: the generic candidates (bare `input` /
/// `button` selectors) routinely match nodes inside collapsed rows and closed
/// menus, and clicking those fails as not-interactable.
pub async fn wait_for_any(client: &Client, selectors: &[&str], timeout: Duration) -> Result<Element> {
    if selectors.is_empty() {
        return Err(TrackexError::browser("Empty selector chain"));
    }
    let deadline = Instant::now() + timeout;
    let mut last_err = None;
    loop {
        for sel in selectors {
            match client.find(Locator::Css(sel)).await {
                Ok(element) => match element.is_displayed().await {
                    Ok(true) => {
                        debug!(selector = sel, "selector matched");
                        return Ok(element);
                    }
                    Ok(false) => {
                        debug!(selector = sel, "element present but hidden");
                    }
                    // Element can go stale between the find and the check
                    Err(e) => last_err = Some(e),
                },
                Err(e) => last_err = Some(e),
            }
        }
        if Instant::now() >= deadline {
            break;
        }
        sleep(Duration::from_millis(250)).await;
    }
    match last_err {
        Some(e) => Err(TrackexError::selector(selectors, e)),
        None => Err(TrackexError::browser(format!(
            "No candidate became visible (tried: {})",
            selectors.join(", ")
        ))),
    }
}

/// Fill an input addressed by a fallback chain, clearing any prior content
pub async fn fill_first(client: &Client, selectors: &[&str], value: &str) -> Result<()> {
    let element = wait_for_any(client, selectors, CHAIN_TIMEOUT).await?;
    element.clear().await?;
    element.send_keys(value).await?;
    Ok(())
}

/// Click the first element a fallback chain resolves to
pub async fn click_first(client: &Client, selectors: &[&str]) -> Result<()> {
    let element = wait_for_any(client, selectors, CHAIN_TIMEOUT).await?;
    element.click().await?;
    Ok(())
}

/// Fixed-interval settle delay
pub async fn settle(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

/// Poll the current URL until it contains `fragment` or the deadline passes.
///
/// Returns whether the fragment appeared. WebDriver errors while polling end
/// the wait early with `false`.
pub async fn wait_for_url_contains(client: &Client, fragment: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match client.current_url().await {
            Ok(url) => {
                if url.as_str().contains(fragment) {
                    return true;
                }
            }
            Err(e) => {
                debug!("url poll failed: {}", e);
                return false;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(500)).await;
    }
}

/// Best-effort wait for `document.readyState == "complete"`.
///
/// The closest WebDriver analog to a network-idle wait. Returns whether the
/// page settled; SPAs that never do fall through to the caller's fixed
/// fallback delay.
pub async fn wait_for_ready(client: &Client, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match client.execute("return document.readyState", vec![]).await {
            Ok(state) if state.as_str() == Some("complete") => return true,
            Ok(_) => {}
            Err(e) => {
                debug!("readyState poll failed: {}", e);
                return false;
            }
        }
        sleep(Duration::from_millis(250)).await;
    }
    false
}
