//! Short-lived per-league cache of merged match lists.
//!
//! Rapid league/tab toggling would otherwise refetch the same three endpoints
//! every time. Entries are keyed by the upper-cased league code and expire
//! after a fixed TTL; an expired entry is treated exactly like a miss.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::models::Match;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    matches: Vec<Match>,
    fetched_at: Instant,
}

pub struct LeagueMatchesCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl LeagueMatchesCache {
    pub fn new(ttl: Duration) -> Self {
        LeagueMatchesCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn key(league: &str) -> String {
        league.trim().to_uppercase()
    }

    /// Fresh entry for `league`, if any.
    pub fn get(&self, league: &str, now: Instant) -> Option<&[Match]> {
        self.entries
            .get(&Self::key(league))
            .filter(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
            .map(|e| e.matches.as_slice())
    }

    pub fn insert(&mut self, league: &str, matches: Vec<Match>, now: Instant) {
        self.entries.insert(
            Self::key(league),
            CacheEntry {
                matches,
                fetched_at: now,
            },
        );
    }

    /// Drop expired entries.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.fetched_at) < ttl);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for LeagueMatchesCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
