//! transit-server — HTTP endpoint for planet-in-house transit lookups.
//!
//! Reads config from env vars:
//!   TRANSIT_SCRAPER_CONFIG — optional YAML config file
//!   TRANSIT_BIND_ADDR      — listen address (default: 0.0.0.0:4000)
//!   TRANSIT_MAX_SESSIONS   — concurrent browser sessions (default: 2)
//!   TRANSIT_HEADLESS       — run Chrome headless (default: true)
//!   CHROME_PATH            — Chrome executable to launch

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transit_core::{ChromiumLauncher, ScraperConfig, TransitScraper};
use transit_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_server=info,transit_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ScraperConfig::load()
        .map_err(|e| anyhow::anyhow!("failed to load scraper configuration: {e}"))?;

    tracing::info!(
        base_url = %config.base_url,
        max_sessions = config.max_sessions,
        headless = config.headless,
        "Configuration loaded"
    );

    let bind_addr = config.bind_addr.clone();
    let launcher = Arc::new(ChromiumLauncher::new(&config));
    let scraper = Arc::new(TransitScraper::new(launcher, config));
    let app = build_router(AppState::new(scraper));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    tracing::info!("Server running on http://{bind_addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
