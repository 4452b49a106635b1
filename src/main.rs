//! trackex - Keyword-tracker search and export automation
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use trackex::{input, tracker, Config, Reporter, Session, SheetsClient, StatusEvent};

/// Search a keyword-tracker dashboard for ASINs and export matching results
#[derive(Parser, Debug)]
#[command(name = "trackex")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array or comma/newline-separated ASINs
    #[arg(long)]
    asins: String,

    /// Persistent Chrome profile directory
    #[arg(long)]
    profile_dir: Option<PathBuf>,

    /// Directory where export downloads are saved
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Service-account JSON key file for the status sheet
    #[arg(long)]
    creds: Option<PathBuf>,

    /// Name of the spreadsheet to append status rows to
    #[arg(long)]
    sheet: Option<String>,

    /// Seconds to wait for the dashboard after login/2FA
    #[arg(long)]
    timeout: Option<u64>,

    /// Run without a visible browser window (2FA becomes impossible)
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries the NDJSON event protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trackex=info")),
        )
        .init();

    let args = Args::parse();
    let reporter = Reporter::stdout();

    // Build configuration with CLI overrides on top
    let mut config = Config::load();
    if let Some(profile_dir) = args.profile_dir {
        config.browser.profile_dir = profile_dir;
    }
    if let Some(download_dir) = args.download_dir {
        config.browser.download_dir = download_dir;
    }
    if let Some(creds) = args.creds {
        config.sheet.creds_path = creds;
    }
    if let Some(sheet) = args.sheet {
        config.sheet.sheet_name = sheet;
    }
    if let Some(timeout) = args.timeout {
        config.tracker.dashboard_timeout_secs = timeout;
    }
    if args.headless {
        config.browser.headed = false;
    }

    let identifiers = input::parse_identifiers(&args.asins);
    if identifiers.is_empty() {
        let _ = reporter.emit(&StatusEvent::fatal("No ASINs provided"));
        return ExitCode::FAILURE;
    }

    if let Err(e) = config.validate() {
        let _ = reporter.emit(&StatusEvent::fatal(e.to_string()));
        return ExitCode::FAILURE;
    }

    match run(&config, &identifiers, &reporter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = reporter.emit(&StatusEvent::fatal(e.to_string()));
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config: &Config,
    identifiers: &[String],
    reporter: &Reporter<std::io::Stdout>,
) -> anyhow::Result<()> {
    let sink = SheetsClient::connect(&config.sheet).await?;

    let session = Session::launch(config).await?;

    // Credential-fill failure is fatal, but the session still needs closing
    let outcome = async {
        session.login(reporter).await?;
        session.goto_tracker().await?;
        tracker::run(&session, &sink, reporter, config, identifiers).await
    }
    .await;

    session.close().await?;
    outcome?;
    Ok(())
}
