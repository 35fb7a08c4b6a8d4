use futures_util::future::{join, join3};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::cache::LeagueMatchesCache;
use super::filter::sort_for_mode;
use super::merge::{merge_sources, MatchSet};
use super::models::{Match, MatchMode, SourceTag};
use crate::error::{FetchError, LoadError};
use crate::feed::MatchFeed;

/// Combines local matches with the season feed into one deduplicated,
/// tagged list per league, cached for a short TTL.
pub struct MatchAggregator {
    feed: Arc<dyn MatchFeed>,
    cache: RwLock<LeagueMatchesCache>,
}

/// Substitute an empty list for a failed source and count the failure.
fn settle<T>(
    failures: &mut usize,
    source: &str,
    scope: &str,
    res: Result<Vec<T>, FetchError>,
) -> Vec<T> {
    match res {
        Ok(v) => v,
        Err(e) => {
            warn!("{} source failed for {}: {}", source, scope, e);
            *failures += 1;
            Vec::new()
        }
    }
}

impl MatchAggregator {
    pub fn new(feed: Arc<dyn MatchFeed>, ttl: Duration) -> Self {
        MatchAggregator {
            feed,
            cache: RwLock::new(LeagueMatchesCache::new(ttl)),
        }
    }

    /// Merged matches of one league: local records first, then the next
    /// round (tagged `upcoming`), then the current round (tagged
    /// `current_tour`). Served from cache while fresh.
    pub async fn league_matches(&self, league: &str) -> Result<Vec<Match>, LoadError> {
        let league = league.trim();
        if league.is_empty() {
            warn!("league_matches called without a league");
            return Ok(Vec::new());
        }

        let now = Instant::now();
        if let Some(cached) = self.cache.read().await.get(league, now) {
            debug!("Using {} cached matches for {}", cached.len(), league);
            return Ok(cached.to_vec());
        }

        let (local, upcoming, previous) = join3(
            self.feed.local_matches(Some(league)),
            self.feed.upcoming_matches(league),
            self.feed.previous_matches(league),
        )
        .await;

        let mut failures = 0;
        let local = settle(&mut failures, "local", league, local);
        let upcoming = settle(&mut failures, "upcoming", league, upcoming);
        let previous = settle(&mut failures, "current-tour", league, previous);
        if failures == 3 {
            return Err(LoadError::AllSourcesFailed {
                league: league.to_string(),
                failures,
            });
        }

        let counts = (local.len(), upcoming.len(), previous.len());
        let mut set = MatchSet::new();
        set.extend(local.into_iter().map(Match::from));
        for m in upcoming {
            set.insert_tagged(Match::from(m), SourceTag::Upcoming);
        }
        for m in previous {
            set.insert_tagged(Match::from(m), SourceTag::CurrentTour);
        }
        let matches = set.into_vec();

        info!(
            "{}: {} matches after merge ({} local, {} upcoming, {} current tour, via {})",
            league,
            matches.len(),
            counts.0,
            counts.1,
            counts.2,
            self.feed.name()
        );

        if !matches.is_empty() {
            let mut cache = self.cache.write().await;
            cache.prune(now);
            cache.insert(league, matches.clone(), now);
        }
        Ok(matches)
    }

    /// Every local match plus the whole season feed, newest first.
    pub async fn season_matches(&self) -> Result<Vec<Match>, LoadError> {
        let (local, season) = join(self.feed.local_matches(None), self.feed.season_matches()).await;

        let mut failures = 0;
        let local = settle(&mut failures, "local", "season", local);
        let season = settle(&mut failures, "season", "season", season);
        if failures == 2 {
            return Err(LoadError::AllSourcesFailed {
                league: "all leagues".to_string(),
                failures,
            });
        }

        let mut merged = merge_sources(
            local.into_iter().map(Match::from).collect(),
            season.into_iter().map(Match::from).collect(),
        );
        sort_for_mode(&mut merged, MatchMode::Past);
        debug!("Season list holds {} matches", merged.len());
        Ok(merged)
    }
}
