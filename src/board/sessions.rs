//! One [`MatchBoard`] per open dashboard page.
//!
//! Each page generates an id when it loads and sends it with every board
//! request. Boards share the aggregator (and its cache) but nothing else, so
//! a league switch on one page never touches another page's panels. Boards
//! not used for `idle_ttl` are dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::MatchBoard;
use crate::matches::MatchAggregator;

const MAX_ID_LEN: usize = 64;

struct Session {
    board: Arc<MatchBoard>,
    last_seen: Instant,
}

pub struct Sessions {
    aggregator: Arc<MatchAggregator>,
    default_league: String,
    debounce: Duration,
    idle_ttl: Duration,
    boards: Mutex<HashMap<String, Session>>,
}

/// Ids are generated client side; keep them short and URL-safe.
pub fn valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Sessions {
    pub fn new(
        aggregator: Arc<MatchAggregator>,
        default_league: &str,
        debounce: Duration,
        idle_ttl: Duration,
    ) -> Self {
        Sessions {
            aggregator,
            default_league: default_league.trim().to_string(),
            debounce,
            idle_ttl,
            boards: Mutex::new(HashMap::new()),
        }
    }

    /// League a new page starts on.
    pub fn default_league(&self) -> &str {
        &self.default_league
    }

    /// Board of page `id`, created on first use. `None` for a malformed id.
    pub fn board(&self, id: &str) -> Option<Arc<MatchBoard>> {
        if !valid_session_id(id) {
            return None;
        }
        let now = Instant::now();
        let mut boards = self.boards.lock().unwrap_or_else(PoisonError::into_inner);

        let before = boards.len();
        let ttl = self.idle_ttl;
        boards.retain(|key, s| key == id || now.saturating_duration_since(s.last_seen) < ttl);
        if boards.len() < before {
            debug!("Dropped {} idle dashboard session(s)", before - boards.len());
        }

        let session = boards.entry(id.to_string()).or_insert_with(|| {
            debug!("New dashboard session {} on {}", id, self.default_league);
            Session {
                board: Arc::new(MatchBoard::new(
                    self.aggregator.clone(),
                    &self.default_league,
                    self.debounce,
                )),
                last_seen: now,
            }
        });
        session.last_seen = now;
        Some(session.board.clone())
    }
}
