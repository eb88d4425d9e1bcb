//! Transit Core - planet-in-house lookups through the transit form
//!
//! Fills a third-party transit form in a real browser, waits for the rendered
//! result and turns its headings into a house → planets mapping.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  TransitScraper (session cap, parse, no partial results)  │
//! └──────────────────────────────────────────────────────────┘
//!                  │                         │
//!                  ▼                         ▼
//! ┌───────────────────────────────┐  ┌─────────────────────┐
//! │  TransitFormWorkflow (FSM)     │  │  parser::parse       │
//! │  coordinate · popup            │  │  "Sun 5th House" …   │
//! └───────────────────────────────┘  └─────────────────────┘
//!                  │
//!                  ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  BrowserLauncher / BrowserSession                          │
//! │  ChromiumLauncher (CDP) · ScriptedLauncher (in-memory)     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use transit_core::{BirthDetails, ChromiumLauncher, ScraperConfig, TransitScraper};
//!
//! let config = ScraperConfig::load()?;
//! let launcher = Arc::new(ChromiumLauncher::new(&config));
//! let scraper = TransitScraper::new(launcher, config);
//!
//! let details = BirthDetails::with_defaults(5, 11, 1990, 14, 30, 28.7, 77.2);
//! let outcome = scraper.scrape(details).await?;
//! println!("{:?}", outcome.house_planets);
//! ```

pub mod config;
pub mod coordinate;
pub mod driver;
pub mod error;
pub mod parser;
pub mod popup;
pub mod service;
pub mod types;
pub mod workflow;

// Re-export main types
pub use config::ScraperConfig;
pub use coordinate::to_astro_format;
pub use driver::{BrowserLauncher, BrowserSession, ChromiumLauncher, Locator, ScriptedLauncher};
pub use error::{DriverError, ParseError, ScrapeError, WorkflowError};
pub use parser::parse;
pub use popup::PopupDismisser;
pub use service::TransitScraper;
pub use types::{
    AstroCoordinate, Axis, BirthDetails, Direction, HousePlanetMap, RawResultLine, ScrapeOutcome,
    Sex,
};
pub use workflow::{TransitFormWorkflow, WorkflowState};
