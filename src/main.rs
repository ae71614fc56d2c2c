//! Migration Pattern Analysis Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring providers, shared state, and middleware.
//!
//! See `README.md` for quickstart.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use migration_pattern_analyzer::api::{create_router, AppState};
use migration_pattern_analyzer::config::AnalysisConfig;
use migration_pattern_analyzer::gdp::{CachedGdpProvider, WorldBankClient, GDP_CACHE_TTL};
use migration_pattern_analyzer::ingest::providers::reddit_json::RedditJsonProvider;
use migration_pattern_analyzer::ingest::{CachedPostProvider, POSTS_CACHE_TTL};
use migration_pattern_analyzer::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - MIGRATION_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("MIGRATION_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("migration=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // REDDIT_USER_AGENT / ANALYSIS_* overrides from .env.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AnalysisConfig::load().expect("Failed to load analysis config");

    let reddit =
        RedditJsonProvider::new(cfg.feed.clone()).expect("Failed to build Reddit client");
    let state = AppState {
        posts: Arc::new(CachedPostProvider::new(reddit)),
        gdp: Arc::new(CachedGdpProvider::new(WorldBankClient::new())),
        cfg,
    };

    let metrics = Metrics::init(POSTS_CACHE_TTL.as_secs(), GDP_CACHE_TTL.as_secs());
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
