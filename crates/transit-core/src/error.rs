//! Error types for the transit scraper
//!
//! Layered the same way the pipeline is: driver failures are wrapped by the
//! workflow with the state they happened in, parse failures stand alone, and
//! `ScrapeError` is what callers of the service see.

use std::time::Duration;

use thiserror::Error;

use crate::workflow::WorkflowState;

/// Failures raised by a browser-automation backend.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("no element matches {locator}")]
    NotFound { locator: String },

    #[error("interaction with {locator} failed: {message}")]
    Interaction { locator: String, message: String },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// Failures of a single form-automation run.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("could not start browser session: {0}")]
    Launch(#[source] DriverError),

    #[error("{state} step failed: {source}")]
    Step {
        state: WorkflowState,
        #[source]
        source: DriverError,
    },

    #[error("result container did not appear within {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl WorkflowError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkflowError::TimedOut(_))
    }
}

/// Failures turning result headings into a house mapping.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("result line {index} does not name a house: {line:?}")]
    UnrecognisedLine { index: usize, line: String },

    #[error("result line {index} names house {house}, expected 1-12")]
    HouseOutOfRange { index: usize, house: String },
}

/// Anything that can make a scrape request fail.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("browser session pool is closed")]
    Unavailable,
}
