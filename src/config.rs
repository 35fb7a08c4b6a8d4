use clap::Parser;
use std::time::Duration;

use crate::matches::KNOWN_LEAGUES;

/// League match dashboard backed by the football REST API
#[derive(Parser, Debug, Clone)]
#[command(name = "matchboard", version, about)]
pub struct Config {
    /// Base URL of the football REST API (news/match/team endpoints)
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8080")]
    pub api_base_url: String,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:3000")]
    pub dashboard_addr: String,

    /// League shown when the dashboard starts
    #[arg(long, env = "DEFAULT_LEAGUE", default_value = "EPL")]
    pub default_league: String,

    /// Seconds a league's merged match list stays cached
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "60")]
    pub cache_ttl_secs: u64,

    /// Milliseconds to wait before acting on a panel trigger
    #[arg(long, env = "DEBOUNCE_MS", default_value = "100")]
    pub debounce_ms: u64,

    /// Minutes of inactivity after which a dashboard page's session is dropped
    #[arg(long, env = "SESSION_IDLE_MINS", default_value = "30")]
    pub session_idle_mins: u64,

    /// Per-request timeout towards the REST API
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let base = url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("api_base_url is not a valid URL: {}", e))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("api_base_url must use http or https");
        }
        if self.default_league.trim().is_empty() {
            anyhow::bail!("default_league must not be empty");
        }
        if !KNOWN_LEAGUES
            .iter()
            .any(|l| l.eq_ignore_ascii_case(self.default_league.trim()))
        {
            tracing::warn!(
                "default_league '{}' is not one of {:?}",
                self.default_league,
                KNOWN_LEAGUES
            );
        }
        if self.cache_ttl_secs == 0 {
            anyhow::bail!("cache_ttl_secs must be positive");
        }
        if self.session_idle_mins == 0 {
            anyhow::bail!("session_idle_mins must be positive");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_mins * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
