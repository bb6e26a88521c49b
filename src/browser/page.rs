//! `LeadPage` over a live Chrome tab.

use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::scripts;
use crate::error::HarvestError;
use crate::page::{CardRead, CardSnapshot, LeadPage, NextControl};

/// One card as returned by the card probe.
#[derive(Debug, serde::Deserialize)]
struct ProbedCard {
    card: Option<CardSnapshot>,
    error: Option<String>,
}

/// A Sales Navigator search tab driven over DevTools.
#[derive(Debug, Clone)]
pub struct ChromeLeadPage {
    page: Page,
}

impl ChromeLeadPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> anyhow::Result<T> {
        self.page
            .evaluate(script)
            .await
            .context("Script evaluation failed")?
            .into_value()
            .context("Unexpected script result")
    }

    /// Evaluate a probe that returns `JSON.stringify(...)`.
    async fn eval_json<T: DeserializeOwned>(&self, script: String) -> anyhow::Result<T> {
        let json: String = self.eval(script).await?;
        serde_json::from_str(&json).context("Probe returned malformed JSON")
    }
}

#[async_trait]
impl LeadPage for ChromeLeadPage {
    type Card = CardSnapshot;

    async fn current_url(&self) -> anyhow::Result<String> {
        self.page
            .url()
            .await?
            .ok_or_else(|| anyhow::anyhow!("Page has no address"))
    }

    async fn record_count(&self) -> anyhow::Result<usize> {
        self.eval(scripts::record_count()).await
    }

    async fn has_scroll_container(&self) -> anyhow::Result<bool> {
        self.eval(scripts::has_scroll_container()).await
    }

    async fn scroll_container_to(&self, fraction: f64) -> anyhow::Result<()> {
        let scrolled: bool = self.eval(scripts::scroll_container_to(fraction)).await?;
        if !scrolled {
            debug!("Lead container disappeared while scrolling");
        }
        Ok(())
    }

    async fn scroll_document(&self) -> anyhow::Result<()> {
        let _: bool = self.eval(scripts::SCROLL_DOCUMENT.to_string()).await?;
        Ok(())
    }

    async fn cards(&self) -> anyhow::Result<Vec<CardRead<CardSnapshot>>> {
        let probed: Vec<ProbedCard> = self.eval_json(scripts::cards()).await?;
        Ok(probed
            .into_iter()
            .enumerate()
            .map(|(index, probe)| match probe {
                ProbedCard {
                    card: Some(card), ..
                } => Ok(card),
                ProbedCard { error, .. } => Err(HarvestError::Extraction {
                    index,
                    reason: error.unwrap_or_else(|| "empty probe result".to_string()),
                }),
            })
            .collect())
    }

    async fn next_control(&self) -> anyhow::Result<Option<NextControl>> {
        self.eval_json(scripts::NEXT_CONTROL.to_string()).await
    }

    async fn navigate(&self, url: &str) -> anyhow::Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }
}
