//! NDJSON status reporting
//!
//! Every major event is written to stdout as one JSON object per line and
//! flushed immediately, so a supervising process can stream the run. All
//! diagnostics go through `tracing` to stderr instead.

use std::io::Write;
use std::sync::Mutex;

use crate::core::{Result, StatusEvent};

/// Writes status events as newline-delimited JSON, one per line
pub struct Reporter<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Emit one event, flushed immediately
    pub fn emit(&self, event: &StatusEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

impl Reporter<std::io::Stdout> {
    /// Reporter bound to stdout, the protocol channel
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_one_line_per_event() {
        let reporter = Reporter::new(Vec::new());
        reporter
            .emit(&StatusEvent::NotFound {
                asin: "B001".to_string(),
            })
            .unwrap();
        reporter
            .emit(&StatusEvent::fatal("No ASINs provided"))
            .unwrap();

        let buf = reporter.out.into_inner().unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""status":"not_found""#));
        assert!(lines[1].contains(r#""status":"error""#));
    }

    #[test]
    fn test_each_line_is_valid_json() {
        let reporter = Reporter::new(Vec::new());
        reporter
            .emit(&StatusEvent::Timeout {
                final_url: "https://example.com/user/signin".to_string(),
                profile_dir: "/tmp/profile".to_string(),
            })
            .unwrap();

        let buf = reporter.out.into_inner().unwrap();
        let text = String::from_utf8(buf).unwrap();
        for line in text.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("status").is_some());
        }
    }
}
