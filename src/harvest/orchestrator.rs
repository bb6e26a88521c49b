//! The harvest state machine.
//!
//! One [`Harvester`] drives one document. Moving to the next page destroys the
//! document, so a page pass that paginates ends with [`RunOutcome::Navigated`];
//! the driver builds a new harvester on the reloaded document and calls
//! [`Harvester::resume`], which picks the session back up from the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::export::{self, ArtifactSink};
use crate::models::{HarvestSession, Record};
use crate::page::LeadPage;
use crate::store::{SessionBackend, SessionStore};
use crate::surface::{self, ControlSurface, Notice, Prompt};

use super::dedup::Deduplicator;
use super::{extract, lazy_load, pagination, readiness};

/// Where the harvester is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Initializing,
    Resuming,
    PageActive,
    Paginating,
    Finishing,
}

impl Phase {
    /// A harvest is underway and must not be started again.
    pub fn is_running(&self) -> bool {
        !matches!(self, Phase::Idle)
    }
}

/// Totals of a finished harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub records: usize,
    pub pages: u32,
    /// Where the export went, if anything was exported.
    pub artifact: Option<String>,
    pub cancelled: bool,
    /// Message of the error that ended the harvest early.
    pub failure: Option<String>,
}

/// Result of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to do here: wrong address, or no session to resume.
    Inactive,
    /// The user declined, or a harvest was already running.
    Declined,
    /// Navigation to the next page was issued; call `resume` once it has loaded.
    Navigated { url: String },
    Finished(HarvestSummary),
}

/// What one page pass decided.
enum PageStep {
    Paginate,
    Finish,
    Cancelled,
}

/// How a pagination attempt ended.
enum PageTurn {
    Navigated(String),
    LastPage,
    Cancelled,
}

/// Shared flag that asks a running harvest to stop and export.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Harvester<P, B, S, K>
where
    P: LeadPage,
    B: SessionBackend,
    S: ControlSurface,
    K: ArtifactSink,
{
    page: P,
    store: SessionStore<B>,
    surface: S,
    sink: K,
    config: HarvestConfig,
    phase: Phase,
    session: HarvestSession,
    dedup: Deduplicator,
    cancel: CancelHandle,
}

impl<P, B, S, K> Harvester<P, B, S, K>
where
    P: LeadPage,
    B: SessionBackend,
    S: ControlSurface,
    K: ArtifactSink,
{
    pub fn new(page: P, backend: B, surface: S, sink: K, config: HarvestConfig) -> Self {
        let store = SessionStore::with_staleness(backend, config.session.staleness_ms);
        Self {
            page,
            store,
            surface,
            sink,
            config,
            phase: Phase::Idle,
            session: HarvestSession::default(),
            dedup: Deduplicator::new(),
            cancel: CancelHandle::new(),
        }
    }

    /// Use an existing cancel flag, e.g. one wired to Ctrl-C.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &HarvestSession {
        &self.session
    }

    pub fn records(&self) -> &[Record] {
        &self.session.records
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    /// Entry point after every document load.
    ///
    /// Continues an active, fresh session; otherwise leaves the harvester idle.
    pub async fn resume(&mut self) -> RunOutcome {
        if !self.on_search_page().await {
            return RunOutcome::Inactive;
        }

        let session = match self.store.load() {
            Some(session) if session.active => session,
            Some(_) => {
                debug!("Stored session is not active, ignoring");
                self.store.clear();
                self.surface.set_status(surface::IDLE_LABEL);
                return RunOutcome::Inactive;
            }
            None => {
                self.surface.set_status(surface::IDLE_LABEL);
                return RunOutcome::Inactive;
            }
        };

        info!(
            "Resuming harvest: {} leads from {} pages",
            session.records.len(),
            session.pages_completed
        );
        self.dedup = Deduplicator::from_keys(session.seen_keys.iter().cloned());
        self.session = session;
        self.phase = Phase::Resuming;
        self.run().await
    }

    /// Start a new harvest on the current page, after confirmation.
    pub async fn start(&mut self) -> RunOutcome {
        if self.phase.is_running() {
            self.surface.notify(Notice::AlreadyRunning);
            return RunOutcome::Declined;
        }
        if !self.on_search_page().await {
            return RunOutcome::Inactive;
        }
        if !self.surface.confirm(Prompt::Start) {
            info!("Harvest start declined");
            return RunOutcome::Declined;
        }

        self.store.clear();
        self.session = HarvestSession::start();
        self.dedup = Deduplicator::new();
        self.phase = Phase::Initializing;
        info!("Starting harvest");
        self.surface.set_status(&surface::initializing_label(0));
        self.run().await
    }

    /// The single user control: start when idle, offer cancel-and-export when a
    /// harvest is underway (running here, or persisted by a previous document).
    pub async fn toggle(&mut self) -> RunOutcome {
        let running_here = self.phase.is_running();
        if !running_here {
            match self.store.load() {
                Some(session) if session.active => {
                    self.dedup = Deduplicator::from_keys(session.seen_keys.iter().cloned());
                    self.session = session;
                }
                _ => return self.start().await,
            }
        }

        let prompt = Prompt::CancelAndExport {
            records: self.session.records.len(),
        };
        if !self.surface.confirm(prompt) {
            if !running_here {
                self.session = HarvestSession::default();
                self.dedup = Deduplicator::new();
            }
            return RunOutcome::Declined;
        }
        self.cancel.cancel();
        self.finish(None, true)
    }

    async fn on_search_page(&self) -> bool {
        let pattern = &self.config.session.activation_pattern;
        match self.page.current_url().await {
            Ok(url) if url.contains(pattern.as_str()) => true,
            Ok(url) => {
                debug!("Not a lead search page: {}", url);
                false
            }
            Err(e) => {
                warn!("Could not read current address: {}", e);
                false
            }
        }
    }

    /// Process the current page, then paginate or finish.
    async fn run(&mut self) -> RunOutcome {
        match self.process_page().await {
            Ok(PageStep::Paginate) => match self.paginate().await {
                Ok(PageTurn::Navigated(url)) => RunOutcome::Navigated { url },
                Ok(PageTurn::LastPage) => self.finish(None, false),
                Ok(PageTurn::Cancelled) => self.finish(None, true),
                Err(e) => self.fail(e),
            },
            Ok(PageStep::Finish) => self.finish(None, false),
            Ok(PageStep::Cancelled) => self.finish(None, true),
            Err(e) => self.fail(e),
        }
    }

    async fn process_page(&mut self) -> Result<PageStep> {
        let url = self.page.current_url().await?;
        let page_number = pagination::page_number(&url)
            .unwrap_or(self.session.pages_completed + 1);
        self.phase = Phase::PageActive;
        info!("=== Harvesting page {} ===", page_number);

        readiness::await_ready(&self.page, &self.config.readiness).await?;
        if self.cancel.is_cancelled() {
            return Ok(PageStep::Cancelled);
        }

        lazy_load::exhaust(&self.page, &self.config.lazy_load).await;
        self.config.pacing.page_settle.pause().await;
        if self.cancel.is_cancelled() {
            return Ok(PageStep::Cancelled);
        }

        let accepted = self.collect_cards().await?;
        self.session.pages_completed += 1;

        if accepted == 0 {
            self.session.consecutive_empty_pages += 1;
            warn!(
                "No new leads on page {} ({} empty in a row)",
                page_number, self.session.consecutive_empty_pages
            );
        } else {
            self.session.consecutive_empty_pages = 0;
            info!("Harvested {} leads from page {}", accepted, page_number);
        }

        self.surface.set_status(&surface::scraping_label(
            self.session.records.len(),
            page_number,
        ));

        let limit = self.config.session.max_consecutive_empty_pages;
        if limit > 0 && self.session.consecutive_empty_pages >= limit {
            warn!("Stopping after {} consecutive empty pages", limit);
            return Ok(PageStep::Finish);
        }

        if !pagination::has_next(&self.page).await {
            info!("No more pages to harvest");
            return Ok(PageStep::Finish);
        }
        Ok(PageStep::Paginate)
    }

    /// Extract, filter and deduplicate every card in document order.
    async fn collect_cards(&mut self) -> Result<usize> {
        let cards = self.page.cards().await?;
        debug!("Found {} lead cards", cards.len());

        let mut accepted = 0;
        for card in cards {
            let card = match card {
                Ok(card) => card,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            let Some(lead) = extract::extract(&card) else {
                debug!("Card yielded no data, skipping");
                continue;
            };
            if !lead.has_name() {
                debug!("Skipping lead without a name");
                continue;
            }
            let record = lead.to_record();
            if self.dedup.accept(&record) {
                self.session.records.push(record);
                accepted += 1;
            }
        }
        self.session.seen_keys = self.dedup.keys().to_vec();
        Ok(accepted)
    }

    /// Persist the session with its next address, pause, and navigate.
    async fn paginate(&mut self) -> Result<PageTurn> {
        self.phase = Phase::Paginating;
        let next = match pagination::next_address(&self.page).await {
            Ok(url) => url,
            Err(HarvestError::NavigationAmbiguity { url, reason }) => {
                warn!("Treating {} as the last page: {}", url, reason);
                return Ok(PageTurn::LastPage);
            }
            Err(e) => return Err(e),
        };

        self.session.active = true;
        self.session.next_url = Some(next.clone());
        self.session.touch();
        self.store.save(&self.session);

        self.config.pacing.inter_page.pause().await;
        if self.cancel.is_cancelled() {
            info!("Cancelled before leaving page {}", self.session.pages_completed);
            return Ok(PageTurn::Cancelled);
        }

        pagination::advance(&self.page, &next).await?;
        Ok(PageTurn::Navigated(next))
    }

    fn fail(&mut self, e: HarvestError) -> RunOutcome {
        error!("Harvest failed: {}", e);
        self.finish(Some(e.to_string()), false)
    }

    /// Clear the session, export what was collected and report once.
    fn finish(&mut self, failure: Option<String>, cancelled: bool) -> RunOutcome {
        self.phase = Phase::Finishing;
        self.store.clear();

        let records = std::mem::take(&mut self.session.records);
        let mut summary = HarvestSummary {
            records: records.len(),
            pages: self.session.pages_completed,
            artifact: None,
            cancelled,
            failure: failure.clone(),
        };
        info!(
            "Harvest complete: {} leads from {} pages",
            summary.records, summary.pages
        );
        let stats = self.dedup.stats();
        info!(
            "Since last reload: {} leads accepted, {} duplicates skipped, {} without profile URL",
            stats.accepted, stats.duplicates, stats.unkeyed
        );

        let mut export_error = None;
        match export::export(&records) {
            Ok(Some(artifact)) => match self.sink.emit(&artifact) {
                Ok(location) => summary.artifact = Some(location),
                Err(e) => {
                    error!("Failed to write export: {:#}", e);
                    export_error = Some(format!("Failed to write export: {:#}", e));
                }
            },
            Ok(None) => {}
            Err(e) => {
                error!("{}", e);
                export_error = Some(e.to_string());
            }
        }

        let notice = match (failure, export_error, &summary.artifact) {
            (Some(message), _, _) | (None, Some(message), _) => Notice::Failed { message },
            (None, None, Some(artifact)) => Notice::Success {
                records: summary.records,
                artifact: artifact.clone(),
            },
            (None, None, None) => Notice::ZeroResults,
        };
        self.surface.notify(notice);

        self.session = HarvestSession::default();
        self.dedup = Deduplicator::new();
        self.phase = Phase::Idle;
        self.surface.set_status(surface::IDLE_LABEL);
        RunOutcome::Finished(summary)
    }
}
