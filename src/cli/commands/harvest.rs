//! `run`: drive a harvest in Chrome across page reloads.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;

use crate::cli::terminal::TerminalSurface;
use crate::config::{HarvestConfig, Settings};
use crate::harvest::{CancelHandle, HarvestSummary};

pub struct RunOptions {
    pub url: String,
    pub assume_yes: bool,
    pub output_dir: Option<PathBuf>,
    pub headed: bool,
    pub remote_url: Option<String>,
    pub cookies_file: Option<PathBuf>,
}

pub async fn cmd_run(
    mut config: HarvestConfig,
    settings: &Settings,
    options: RunOptions,
) -> anyhow::Result<()> {
    if options.headed {
        config.browser.headless = false;
    }
    if options.remote_url.is_some() {
        config.browser.remote_url = options.remote_url.clone();
    }
    if options.cookies_file.is_some() {
        config.browser.cookies_file = options.cookies_file.clone();
    }
    if !options
        .url
        .contains(config.session.activation_pattern.as_str())
    {
        anyhow::bail!(
            "{} is not a lead search (expected an address containing {})",
            options.url,
            config.session.activation_pattern
        );
    }

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.output_dir.clone());

    let cancel = CancelHandle::new();
    spawn_interrupt_handler(cancel.clone());

    let surface = Arc::new(TerminalSurface::new(options.assume_yes));
    let result = drive(config, settings, &options.url, output_dir, surface.clone(), cancel).await;
    surface.finish();

    if let Some(summary) = result? {
        print_summary(&summary);
    }
    Ok(())
}

/// First Ctrl-C cancels and exports; a second one exits immediately.
fn spawn_interrupt_handler(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!(
            "\n{} Interrupted, finishing the current step and exporting...",
            style("!").yellow()
        );
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

#[cfg(feature = "browser")]
async fn drive(
    config: HarvestConfig,
    settings: &Settings,
    url: &str,
    output_dir: PathBuf,
    surface: Arc<TerminalSurface>,
    cancel: CancelHandle,
) -> anyhow::Result<Option<HarvestSummary>> {
    use tracing::{debug, info};

    use crate::browser::{BrowserSession, ChromeLeadPage};
    use crate::export::DirectorySink;
    use crate::harvest::{Harvester, RunOutcome};
    use crate::store::{FileBackend, SessionStore};

    let backend = Arc::new(FileBackend::new(&settings.data_dir));
    let sink = DirectorySink::new(output_dir);

    let interrupted = SessionStore::with_staleness(backend.clone(), config.session.staleness_ms)
        .load()
        .filter(|session| session.active);
    let target = match &interrupted {
        Some(session) => {
            let target = session.resume_url(url);
            info!(
                "Found an interrupted harvest ({} leads, {} pages), resuming at {}",
                session.records.len(),
                session.pages_completed,
                target
            );
            target
        }
        None => url,
    };

    let browser = BrowserSession::open(config.browser.clone()).await?;
    let page = browser.open_search(target).await?;

    let harvester = |page: ChromeLeadPage| {
        Harvester::new(
            page,
            backend.clone(),
            surface.clone(),
            sink.clone(),
            config.clone(),
        )
        .with_cancel(cancel.clone())
    };

    let mut first = harvester(page.clone());
    let mut outcome = if interrupted.is_some() {
        first.resume().await
    } else {
        first.start().await
    };

    let summary = loop {
        match outcome {
            RunOutcome::Navigated { url } => {
                debug!("Loaded {}", url);
                outcome = harvester(page.clone()).resume().await;
            }
            RunOutcome::Finished(summary) => break Some(summary),
            RunOutcome::Inactive => {
                println!(
                    "{} Page is not a lead search; nothing to do",
                    style("!").yellow()
                );
                break None;
            }
            RunOutcome::Declined => {
                println!("{} Cancelled", style("!").yellow());
                break None;
            }
        }
    };

    browser.close().await;
    Ok(summary)
}

#[cfg(not(feature = "browser"))]
async fn drive(
    _config: HarvestConfig,
    _settings: &Settings,
    _url: &str,
    _output_dir: PathBuf,
    _surface: Arc<TerminalSurface>,
    _cancel: CancelHandle,
) -> anyhow::Result<Option<HarvestSummary>> {
    Err(anyhow::anyhow!(
        "Browser support not compiled. Rebuild with: cargo build --features browser"
    ))
}

fn print_summary(summary: &HarvestSummary) {
    println!("\n{}", style("Harvest Summary").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Leads:", summary.records);
    println!("{:<20} {}", "Pages:", summary.pages);
    if let Some(ref artifact) = summary.artifact {
        println!("{:<20} {}", "CSV file:", artifact);
    }
    if summary.cancelled {
        println!("{:<20} {}", "Stopped:", style("cancelled").yellow());
    }
    if let Some(ref failure) = summary.failure {
        println!("{:<20} {}", "Error:", style(failure).red());
    }
}
