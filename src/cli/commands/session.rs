//! Saved-session commands: `status`, `clear`, `export`.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use console::style;

use crate::config::{HarvestConfig, Settings};
use crate::export::{self, ArtifactSink, DirectorySink};
use crate::models::now_epoch_ms;
use crate::store::{FileBackend, SessionStore, SESSION_KEY};

fn open_store(config: &HarvestConfig, settings: &Settings) -> SessionStore<FileBackend> {
    SessionStore::with_staleness(
        FileBackend::new(&settings.data_dir),
        config.session.staleness_ms,
    )
}

pub fn cmd_status(config: &HarvestConfig, settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(config, settings);
    let Some(session) = store.load() else {
        println!("{} No saved harvest session", style("!").yellow());
        return Ok(());
    };

    println!("\n{}", style("Harvest Session").bold());
    println!("{}", "-".repeat(40));

    let status = if session.active {
        style("Active (resumable)").green().to_string()
    } else {
        style("Inactive").dim().to_string()
    };
    println!("{:<20} {}", "Status:", status);
    println!("{:<20} {}", "Pages completed:", session.pages_completed);
    println!("{:<20} {}", "Leads:", session.records.len());
    println!("{:<20} {}", "Profile URLs seen:", session.seen_keys.len());
    if session.consecutive_empty_pages > 0 {
        println!(
            "{:<20} {}",
            "Empty pages in a row:", session.consecutive_empty_pages
        );
    }

    if let Some(ref next) = session.next_url {
        println!("{:<20} {}", "Resumes at:", next);
    }

    if let Some(updated) = DateTime::<Utc>::from_timestamp_millis(session.updated_at_epoch_ms) {
        println!(
            "{:<20} {} ({} min ago)",
            "Last Updated:",
            updated.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            session.age_ms(now_epoch_ms()) / 60_000
        );
    }
    println!(
        "{:<20} {}",
        "Session file:",
        store.backend().path_for(SESSION_KEY).display()
    );
    Ok(())
}

pub fn cmd_clear(config: &HarvestConfig, settings: &Settings) -> anyhow::Result<()> {
    open_store(config, settings).clear();
    println!("{} Harvest session cleared", style("✓").green());
    Ok(())
}

pub fn cmd_export(
    config: &HarvestConfig,
    settings: &Settings,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = open_store(config, settings);
    let Some(session) = store.load() else {
        println!("{} No saved harvest session to export", style("!").yellow());
        return Ok(());
    };

    let Some(artifact) = export::export(&session.records)? else {
        println!(
            "{} Saved session has no leads; clearing it",
            style("!").yellow()
        );
        store.clear();
        return Ok(());
    };

    let dir = out.unwrap_or_else(|| settings.output_dir.clone());
    let location = DirectorySink::new(dir).emit(&artifact)?;
    store.clear();

    println!(
        "{} Exported {} leads from {} pages to {}",
        style("✓").green(),
        session.records.len(),
        session.pages_completed,
        location
    );
    Ok(())
}
