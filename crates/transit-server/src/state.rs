//! Shared application state

use std::sync::Arc;

use transit_core::TransitScraper;

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<TransitScraper>,
}

impl AppState {
    pub fn new(scraper: Arc<TransitScraper>) -> Self {
        Self { scraper }
    }
}
