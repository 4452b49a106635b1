//! Browser session management
//!
//! Spawns chromedriver, connects a fantoccini client bound to a persistent
//! Chrome profile (so cookies survive across runs and repeat logins are
//! skipped), and walks the sign-in flow: credential form with selector
//! fallbacks, manual two-factor suspension, and a bounded, non-fatal wait for
//! the dashboard.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::browser::locate::{
    click_first, fill_first, settle, wait_for_any, wait_for_ready, wait_for_url_contains,
};
use crate::core::{Config, Result, StatusEvent, TrackexError};
use crate::report::Reporter;

/// Candidate selectors for the sign-in email field
const EMAIL_SELECTORS: &[&str] = &[
    r#"input[name="LoginForm[email]"]"#,
    "input#email",
    r#"input[type="text"]"#,
];

/// Candidate selectors for the sign-in password field
const PASSWORD_SELECTORS: &[&str] = &[
    r#"input[name="LoginForm[password]"]"#,
    "input#password",
    r#"input[type="password"]"#,
];

/// Candidate selectors for the sign-in submit control
const SUBMIT_SELECTORS: &[&str] = &[
    r#"button[type="submit"]"#,
    "form button.btn-primary",
    r#"input[type="submit"]"#,
];

/// Candidate selectors for the tracker's search input
pub const SEARCH_BOX_SELECTORS: &[&str] = &[
    r#"input[type="search"]"#,
    r#"input[name="search"]"#,
    ".kt-search input",
    "#search",
    r#"input[name="q"]"#,
];

/// An authenticated browser session over a spawned chromedriver
pub struct Session {
    client: Client,
    driver: Child,
    config: Config,
}

impl Session {
    /// Spawn chromedriver and open a Chrome window on the persistent profile.
    ///
    /// Headed by default: the operator must be able to type a 2FA code.
    pub async fn launch(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.browser.profile_dir)?;
        std::fs::create_dir_all(&config.browser.download_dir)?;

        let driver = spawn_driver(config.browser.driver_port)?;
        let url = config.webdriver_url();

        if let Err(e) = await_driver_ready(&url, Duration::from_secs(10)).await {
            let mut driver = driver;
            let _ = driver.kill();
            return Err(e);
        }

        info!(url = %url, "chromedriver ready, opening session");
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(config))
            .connect(&url)
            .await?;

        Ok(Self {
            client,
            driver,
            config: config.clone(),
        })
    }

    /// The underlying WebDriver client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sign in, pausing for manual 2FA if the site asks for a code.
    ///
    /// Credential-fill selector exhaustion is the one fatal failure here; the
    /// dashboard wait timing out is reported and execution continues.
    pub async fn login<W: Write>(&self, reporter: &Reporter<W>) -> Result<()> {
        let client = &self.client;
        let tracker = &self.config.tracker;

        client.goto(&tracker.signin_url).await?;

        // Let either the login form or the code-required page mount
        let _ = wait_for_any(client, EMAIL_SELECTORS, Duration::from_secs(10)).await;
        settle(500).await;

        let url = client.current_url().await?;
        if url.as_str().contains("signin") {
            fill_first(client, EMAIL_SELECTORS, &self.config.credentials.email).await?;
            settle(300).await;
            fill_first(client, PASSWORD_SELECTORS, &self.config.credentials.password).await?;
            settle(300).await;
            click_first(client, SUBMIT_SELECTORS).await?;

            // Give the post-submit navigation time to land
            if !wait_for_ready(client, Duration::from_secs(30)).await {
                // Some SPAs never reach a settled state; brief fallback wait
                settle(1500).await;
            }
            settle(1000).await;
        } else {
            info!("already authenticated, skipping credential form");
        }

        let url = client.current_url().await?;
        if url.as_str().contains(&tracker.code_required_path) {
            reporter.emit(&StatusEvent::TwoFactorRequired {
                message: "Enter the code manually in the Chrome window, then press Enter here to continue.".to_string(),
            })?;
            wait_for_operator().await?;
        }

        let dashboard_timeout = Duration::from_secs(tracker.dashboard_timeout_secs);
        if wait_for_url_contains(client, &tracker.dashboard_fragment, dashboard_timeout).await {
            // Allow dashboard widgets to finish their initial XHRs
            settle(1500).await;
        } else {
            warn!("dashboard did not appear within {:?}", dashboard_timeout);
            reporter.emit(&StatusEvent::Timeout {
                final_url: self.current_url_lossy().await,
                profile_dir: self.config.browser.profile_dir.display().to_string(),
            })?;
        }

        settle(1000).await;
        Ok(())
    }

    /// Navigate to the keyword tracker page and wait for its search UI
    pub async fn goto_tracker(&self) -> Result<()> {
        self.client.goto(&self.config.tracker.tracker_url).await?;

        let _ = wait_for_any(&self.client, SEARCH_BOX_SELECTORS, Duration::from_secs(15)).await;
        settle(500).await;
        settle(1000).await;
        Ok(())
    }

    /// Current URL as a string, empty if the poll fails
    pub async fn current_url_lossy(&self) -> String {
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default()
    }

    /// Close the browser window and stop chromedriver
    pub async fn close(mut self) -> Result<()> {
        self.client.clone().close().await?;
        if let Err(e) = self.driver.kill() {
            warn!("failed to stop chromedriver: {}", e);
        }
        Ok(())
    }
}

/// Block until the operator presses Enter in the terminal.
///
/// No deadline: the wait ends only when the operator finishes the 2FA
/// challenge and acknowledges it.
async fn wait_for_operator() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .map_err(|e| TrackexError::Other(format!("operator wait interrupted: {}", e)))??;
    Ok(())
}

fn spawn_driver(port: u16) -> Result<Child> {
    Command::new("chromedriver")
        .arg(format!("--port={}", port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrackexError::DriverNotFound
            } else {
                TrackexError::browser(format!("Failed to start chromedriver: {}", e))
            }
        })
}

/// Poll the driver's /status endpoint until it answers
async fn await_driver_ready(url: &str, timeout: Duration) -> Result<()> {
    let http = reqwest::Client::new();
    let status_url = format!("{}/status", url);
    let deadline = Instant::now() + timeout;

    loop {
        if let Ok(resp) = http.get(&status_url).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        if Instant::now() >= deadline {
            return Err(TrackexError::browser(format!(
                "chromedriver did not become ready at {}",
                status_url
            )));
        }
        sleep(Duration::from_millis(200)).await;
    }
}

/// Chrome capabilities: persistent profile, download directory, headed window
fn chrome_capabilities(config: &Config) -> serde_json::Map<String, serde_json::Value> {
    let mut args = vec![
        format!("--user-data-dir={}", config.browser.profile_dir.display()),
        "--start-maximized".to_string(),
    ];
    if !config.browser.headed {
        args.push("--headless=new".to_string());
    }

    let options = serde_json::json!({
        "args": args,
        "prefs": {
            "download.default_directory": config.browser.download_dir.display().to_string(),
            "download.prompt_for_download": false,
            "download.directory_upgrade": true,
        }
    });

    let mut caps = serde_json::Map::new();
    caps.insert("goog:chromeOptions".to_string(), options);
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_capabilities_carry_profile_and_downloads() {
        let mut config = Config::default();
        config.browser.profile_dir = "/tmp/trackex-profile".into();
        config.browser.download_dir = "/tmp/trackex-downloads".into();

        let caps = chrome_capabilities(&config);
        let options = caps.get("goog:chromeOptions").unwrap();
        let args = options.get("args").unwrap().to_string();
        assert!(args.contains("--user-data-dir=/tmp/trackex-profile"));
        assert!(args.contains("--start-maximized"));
        assert!(!args.contains("--headless"));

        let prefs = options.get("prefs").unwrap();
        assert_eq!(
            prefs.get("download.default_directory").unwrap(),
            "/tmp/trackex-downloads"
        );
    }

    #[test]
    fn test_headless_flag_only_when_not_headed() {
        let mut config = Config::default();
        config.browser.headed = false;
        let caps = chrome_capabilities(&config);
        let args = caps.get("goog:chromeOptions").unwrap()["args"].to_string();
        assert!(args.contains("--headless=new"));
    }
}
