//! HTTP boundary for transit lookups.
//!
//! Exposes `GET /scraper` over a shared [`transit_core::TransitScraper`] and a
//! `GET /health` liveness probe.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::AppError;
pub use router::build_router;
pub use state::AppState;
