//! In-memory page used by the harvest unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HarvestError;
use crate::page::{CardRead, CardSnapshot, LeadPage, NextControl};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub url: String,
    pub count: usize,
    /// Scripted record counts, consumed one per `record_count` call.
    pub count_script: VecDeque<usize>,
    /// Scroll passes that still grow the list when they reach the end.
    pub growth_remaining: usize,
    pub growth_per_pass: usize,
    pub scrollable: bool,
    pub scroll_log: Vec<f64>,
    pub document_scrolls: usize,
    pub measurements: usize,
    pub cards: Vec<Result<CardSnapshot, String>>,
    pub next: Option<NextControl>,
    pub navigations: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FakePage {
    pub state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: url.to_string(),
                scrollable: true,
                ..Default::default()
            }),
        }
    }

    pub fn with<F: FnOnce(&mut FakeState)>(self, f: F) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn snapshot<R>(&self, f: impl FnOnce(&FakeState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }
}

pub(crate) fn card(name: &str, href: &str) -> CardSnapshot {
    CardSnapshot {
        names: vec![name.to_string()],
        profile_hrefs: vec![href.to_string()],
        ..Default::default()
    }
}

#[async_trait]
impl LeadPage for FakePage {
    type Card = CardSnapshot;

    async fn current_url(&self) -> anyhow::Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn record_count(&self) -> anyhow::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.measurements += 1;
        if let Some(next) = state.count_script.pop_front() {
            state.count = next;
        }
        Ok(state.count)
    }

    async fn has_scroll_container(&self) -> anyhow::Result<bool> {
        Ok(self.state.lock().unwrap().scrollable)
    }

    async fn scroll_container_to(&self, fraction: f64) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.scroll_log.push(fraction);
        if fraction >= 1.0 && state.growth_remaining > 0 {
            state.growth_remaining -= 1;
            state.count += state.growth_per_pass;
        }
        Ok(())
    }

    async fn scroll_document(&self) -> anyhow::Result<()> {
        self.state.lock().unwrap().document_scrolls += 1;
        Ok(())
    }

    async fn cards(&self) -> anyhow::Result<Vec<CardRead<CardSnapshot>>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cards
            .iter()
            .enumerate()
            .map(|(index, c)| {
                c.clone()
                    .map_err(|reason| HarvestError::Extraction { index, reason })
            })
            .collect())
    }

    async fn next_control(&self) -> anyhow::Result<Option<NextControl>> {
        Ok(self.state.lock().unwrap().next.clone())
    }

    async fn navigate(&self, url: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.url = url.to_string();
        Ok(())
    }
}
