//! User-facing control surface: status readout, prompts and notices.

use std::sync::Arc;

/// Confirmation prompts shown before state-changing actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Start,
    /// Cancel a running harvest and export what was collected so far.
    CancelAndExport { records: usize },
}

impl Prompt {
    pub fn text(&self) -> String {
        match self {
            Prompt::Start => "Start scraping leads from this Sales Navigator search?\n\n\
                 This will:\n\
                 - Scrape all visible lead data\n\
                 - Handle pagination automatically\n\
                 - Export to CSV when complete\n\n\
                 Keep this tab open during scraping."
                .to_string(),
            Prompt::CancelAndExport { records } => format!(
                "A harvest is already running ({} leads so far).\n\n\
                 Stop now and export the collected leads?",
                records
            ),
        }
    }
}

/// Terminal and interim notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Harvest finished and exported.
    Success { records: usize, artifact: String },
    ZeroResults,
    Failed { message: String },
    /// A start request arrived while a harvest was running.
    AlreadyRunning,
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::Success { records, artifact } => {
                format!("Successfully scraped {} leads!\n\nCSV file: {}", records, artifact)
            }
            Notice::ZeroResults => {
                "No leads found. LinkedIn may have changed their structure.".to_string()
            }
            Notice::Failed { message } => format!("Error during scraping:\n{}", message),
            Notice::AlreadyRunning => "Scraping already in progress!".to_string(),
        }
    }
}

/// Presentation layer driven by the orchestrator.
pub trait ControlSurface: Send + Sync {
    /// Replace the passive status label.
    fn set_status(&self, text: &str);

    /// Ask the user to confirm; `false` aborts the action.
    fn confirm(&self, prompt: Prompt) -> bool;

    fn notify(&self, notice: Notice);
}

impl<T: ControlSurface + ?Sized> ControlSurface for Arc<T> {
    fn set_status(&self, text: &str) {
        (**self).set_status(text)
    }

    fn confirm(&self, prompt: Prompt) -> bool {
        (**self).confirm(prompt)
    }

    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Status label text for the idle toggle.
pub const IDLE_LABEL: &str = "Scrape Leads to CSV";

pub fn initializing_label(records: usize) -> String {
    format!("Initializing... {} leads", records)
}

pub fn scraping_label(records: usize, page: u32) -> String {
    format!("Scraping... {} leads (Page {})", records, page)
}
