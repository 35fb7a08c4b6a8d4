use async_trait::async_trait;

use crate::error::FetchError;
use crate::league::{Scorer, StandingsPayload, Team, TeamsByLeague};
use crate::matches::{ExternalMatch, LocalMatch};

/// Source of raw match records: the local backend plus the season feed.
#[async_trait]
pub trait MatchFeed: Send + Sync {
    /// Locally created matches, optionally filtered server-side by league.
    async fn local_matches(&self, league: Option<&str>) -> Result<Vec<LocalMatch>, FetchError>;

    /// Every feed match of the season, all leagues.
    async fn season_matches(&self) -> Result<Vec<ExternalMatch>, FetchError>;

    /// Feed matches of the next round for `league`.
    async fn upcoming_matches(&self, league: &str) -> Result<Vec<ExternalMatch>, FetchError>;

    /// Feed matches of the current round for `league`.
    async fn previous_matches(&self, league: &str) -> Result<Vec<ExternalMatch>, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Rosters, tables and scorers.
#[async_trait]
pub trait LeagueFeed: Send + Sync {
    async fn actual_teams(&self) -> Result<TeamsByLeague, FetchError>;

    async fn user_teams(&self) -> Result<Vec<Team>, FetchError>;

    async fn standings(&self, league: &str) -> Result<StandingsPayload, FetchError>;

    async fn scorers(&self, league: &str) -> Result<Vec<Scorer>, FetchError>;
}
