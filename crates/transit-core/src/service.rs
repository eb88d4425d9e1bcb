//! Scrape service: workflow + parser behind a cap on live browser sessions.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::ScraperConfig;
use crate::driver::BrowserLauncher;
use crate::error::ScrapeError;
use crate::parser;
use crate::types::{BirthDetails, ScrapeOutcome};
use crate::workflow::TransitFormWorkflow;

/// Entry point for callers: one `scrape` per lookup, safe to share.
pub struct TransitScraper {
    workflow: TransitFormWorkflow,
    sessions: Arc<Semaphore>,
}

impl TransitScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: ScraperConfig) -> Self {
        let permits = config.max_sessions.max(1);
        Self {
            workflow: TransitFormWorkflow::new(launcher, config),
            sessions: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Session permits not currently in use.
    pub fn available_sessions(&self) -> usize {
        self.sessions.available_permits()
    }

    /// Fill the form for `details` and parse what it renders.
    ///
    /// Waits for a free session slot first. The slot stays taken until the
    /// browser has quit, even if this future is dropped part way. Either the
    /// full mapping is returned or an error; never a partial result.
    pub async fn scrape(&self, details: BirthDetails) -> Result<ScrapeOutcome, ScrapeError> {
        let permit = Arc::clone(&self.sessions)
            .acquire_owned()
            .await
            .map_err(|_| ScrapeError::Unavailable)?;

        tracing::info!(
            day = details.day,
            month = details.month,
            year = details.year,
            latitude = details.latitude,
            longitude = details.longitude,
            "Starting transit scrape"
        );

        let raw_planet_info = self.workflow.run_with_permit(&details, permit).await?;
        let house_planets = parser::parse(&raw_planet_info)?;

        tracing::debug!(houses = house_planets.len(), "House to planets map built");

        Ok(ScrapeOutcome {
            input: details,
            house_planets,
            raw_planet_info,
        })
    }
}
