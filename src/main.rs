use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

mod board;
mod config;
mod dashboard;
mod error;
mod feed;
mod league;
mod matches;

use board::Sessions;
use config::Config;
use dashboard::AppState;
use feed::{MatchFeed, RestFeed};
use league::LeagueData;
use matches::MatchAggregator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let feed = Arc::new(
        RestFeed::new(&config.api_base_url, config.request_timeout())
            .context("building REST client")?,
    );
    info!(
        "Using {} at {} (cache TTL {}s, debounce {}ms)",
        feed.name(),
        config.api_base_url,
        config.cache_ttl_secs,
        config.debounce_ms
    );

    let aggregator = Arc::new(MatchAggregator::new(feed.clone(), config.cache_ttl()));
    let sessions = Arc::new(Sessions::new(
        aggregator.clone(),
        &config.default_league,
        config.debounce(),
        config.session_idle(),
    ));

    // Warm the cache for the league the page opens with
    {
        let aggregator = aggregator.clone();
        let league = config.default_league.clone();
        tokio::spawn(async move {
            match aggregator.league_matches(&league).await {
                Ok(matches) => info!("Prefetched {} matches for {}", matches.len(), league),
                Err(e) => warn!("Prefetch for {} failed: {}", league, e),
            }
        });
    }

    let app = dashboard::router(AppState {
        sessions,
        aggregator,
        league: Arc::new(LeagueData::new(feed)),
    });
    let addr: SocketAddr = config
        .dashboard_addr
        .parse()
        .with_context(|| format!("invalid dashboard address {}", config.dashboard_addr))?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
