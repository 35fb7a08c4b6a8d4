//! Page session: the active league, debounced panel triggers and the render
//! guard, on top of a shared [`MatchAggregator`].

pub mod guard;
pub mod sessions;

pub use sessions::Sessions;

#[cfg(test)]
pub use guard::RenderState;

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::matches::{filter_by_mode, Match, MatchAggregator, MatchMode};
use guard::{Admission, Completion, RenderGuard, RenderKey, RenderTicket};

/// Data handed to the rendering adapter for one panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPanel {
    pub container: String,
    pub mode: MatchMode,
    pub league: String,
    pub matches: Vec<Match>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(MatchPanel),
    /// Loading failed; the panel carries the error message
    Failed(MatchPanel),
    /// A later trigger for the same container replaced this one
    Coalesced,
    /// The same panel is already loading this league
    AlreadyLoading,
    /// The league changed before the result was ready
    Stale,
}

struct BoardState {
    league: String,
    guard: RenderGuard,
    debounce_tokens: HashMap<String, u64>,
    next_token: u64,
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A render between admission and completion. Dropping it unsettled (the
/// caller went away mid-fetch) hands the panel back to `Idle`.
struct InFlight<'a> {
    state: &'a Mutex<BoardState>,
    ticket: Option<RenderTicket>,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: Result<(), String>) -> Completion {
        let Some(ticket) = self.ticket.take() else {
            return Completion::Discarded;
        };
        let mut state = lock(self.state);
        let active = state.league.clone();
        state.guard.finish(&ticket, &active, outcome)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            lock(self.state).guard.release(&ticket);
        }
    }
}

/// One dashboard page.
///
/// State is behind a plain mutex that is never held across an await.
pub struct MatchBoard {
    aggregator: Arc<MatchAggregator>,
    debounce: Duration,
    state: Mutex<BoardState>,
}

impl MatchBoard {
    pub fn new(aggregator: Arc<MatchAggregator>, league: &str, debounce: Duration) -> Self {
        MatchBoard {
            aggregator,
            debounce,
            state: Mutex::new(BoardState {
                league: league.trim().to_string(),
                guard: RenderGuard::new(),
                debounce_tokens: HashMap::new(),
                next_token: 0,
            }),
        }
    }

    pub fn league(&self) -> String {
        lock(&self.state).league.clone()
    }

    /// Make `league` the active league. Panels still loading the previous
    /// league will drop their results. Returns false when nothing changed.
    pub fn switch_league(&self, league: &str) -> bool {
        let league = league.trim();
        let mut state = lock(&self.state);
        if state.league.eq_ignore_ascii_case(league) {
            return false;
        }
        let released = state.guard.release_stale(league);
        info!(
            "League switched {} -> {} ({} in-flight panel(s) abandoned)",
            state.league, league, released
        );
        state.league = league.to_string();
        true
    }

    #[cfg(test)]
    pub fn panel_state(&self, container: &str, mode: MatchMode) -> RenderState {
        lock(&self.state).guard.state(&RenderKey::new(container, mode))
    }

    /// Load and filter the matches of the active league for one panel.
    ///
    /// Triggers for the same container within the debounce window collapse
    /// into the last one. The league is re-checked after the debounce and the
    /// result is committed only if it is still current once the fetch
    /// completes.
    pub async fn render(&self, container: &str, mode: MatchMode) -> RenderOutcome {
        let (league, token) = {
            let mut state = lock(&self.state);
            state.next_token += 1;
            let token = state.next_token;
            state.debounce_tokens.insert(container.to_string(), token);
            (state.league.clone(), token)
        };

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }

        let pending = {
            let mut state = lock(&self.state);
            if state.debounce_tokens.get(container) != Some(&token) {
                debug!("{} trigger {} coalesced", container, token);
                return RenderOutcome::Coalesced;
            }
            state.debounce_tokens.remove(container);
            if !state.league.eq_ignore_ascii_case(&league) {
                debug!(
                    "{}: league changed to {} during debounce, dropping {}",
                    container, state.league, league
                );
                return RenderOutcome::Stale;
            }
            match state.guard.begin(RenderKey::new(container, mode), &league) {
                Admission::Started(ticket) => InFlight {
                    state: &self.state,
                    ticket: Some(ticket),
                },
                Admission::AlreadyLoading => return RenderOutcome::AlreadyLoading,
            }
        };

        match self.aggregator.league_matches(&league).await {
            Ok(matches) => {
                let prepared = filter_by_mode(&matches, &league, mode, Utc::now());
                match pending.settle(Ok(())) {
                    Completion::Committed => {
                        debug!(
                            "{} ({}): {} of {} matches for {}",
                            container,
                            mode,
                            prepared.len(),
                            matches.len(),
                            league
                        );
                        RenderOutcome::Rendered(MatchPanel {
                            container: container.to_string(),
                            mode,
                            league,
                            matches: prepared,
                            error: None,
                        })
                    }
                    Completion::Discarded => RenderOutcome::Stale,
                }
            }
            Err(e) => {
                let message = e.to_string();
                match pending.settle(Err(message.clone())) {
                    Completion::Committed => {
                        warn!("{} ({}) failed to load: {}", container, mode, message);
                        RenderOutcome::Failed(MatchPanel {
                            container: container.to_string(),
                            mode,
                            league,
                            matches: Vec::new(),
                            error: Some(message),
                        })
                    }
                    Completion::Discarded => RenderOutcome::Stale,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::testing::FakeFeed;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use tokio::sync::Notify;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn board(feed: FakeFeed, league: &str) -> (Arc<FakeFeed>, Arc<MatchBoard>) {
        let feed = Arc::new(feed);
        let agg = Arc::new(MatchAggregator::new(feed.clone(), Duration::from_secs(60)));
        (feed, Arc::new(MatchBoard::new(agg, league, DEBOUNCE)))
    }

    fn kickoff(days: i64) -> String {
        (Utc::now() + ChronoDuration::days(days)).to_rfc3339()
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_filters_active_league_by_mode() {
        let (_, board) = board(
            FakeFeed::new()
                .local(json!({"id": 1, "league": "EPL", "kickoffAt": kickoff(-2)}))
                .local(json!({"id": 2, "league": "EPL", "kickoffAt": kickoff(-1)}))
                .upcoming(json!({"id": 3, "league": "EPL", "kickoffAt": kickoff(3)})),
            "EPL",
        );

        match board.render("past-matches", MatchMode::Past).await {
            RenderOutcome::Rendered(panel) => {
                assert_eq!(panel.league, "EPL");
                assert_eq!(panel.matches.len(), 2);
                assert!(panel.matches[0].kickoff_at > panel.matches[1].kickoff_at);
            }
            other => panic!("unexpected: {:?}", other),
        }
        match board.render("upcoming-matches", MatchMode::Upcoming).await {
            RenderOutcome::Rendered(panel) => assert_eq!(panel.matches.len(), 1),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(
            board.panel_state("past-matches", MatchMode::Past),
            RenderState::Rendered { league: "EPL".into() }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_for_previous_league_is_dropped() {
        let gate = Arc::new(Notify::new());
        let (_, board) = board(
            FakeFeed::new()
                .gated("EPL", gate.clone())
                .local(json!({"id": 1, "league": "EPL", "kickoffAt": kickoff(-1)})),
            "EPL",
        );

        let b = board.clone();
        let pending = tokio::spawn(async move { b.render("past-matches", MatchMode::Past).await });

        // past the debounce; the EPL fetch is now parked on the gate
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(matches!(
            board.panel_state("past-matches", MatchMode::Past),
            RenderState::Loading { .. }
        ));

        assert!(board.switch_league("LaLiga"));
        gate.notify_one();

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, RenderOutcome::Stale));
        assert_eq!(board.panel_state("past-matches", MatchMode::Past), RenderState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_trigger_while_loading_is_noop() {
        let gate = Arc::new(Notify::new());
        let (feed, board) = board(
            FakeFeed::new()
                .gated("EPL", gate.clone())
                .local(json!({"id": 1, "league": "EPL", "kickoffAt": kickoff(-1)})),
            "EPL",
        );

        let b = board.clone();
        let first = tokio::spawn(async move { b.render("past-matches", MatchMode::Past).await });
        tokio::time::sleep(Duration::from_millis(150)).await;

        let second = board.render("past-matches", MatchMode::Past).await;
        assert!(matches!(second, RenderOutcome::AlreadyLoading));

        gate.notify_one();
        assert!(matches!(first.await.unwrap(), RenderOutcome::Rendered(_)));
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_render_releases_panel() {
        let gate = Arc::new(Notify::new());
        let (_, board) = board(
            FakeFeed::new()
                .gated("EPL", gate.clone())
                .local(json!({"id": 1, "league": "EPL", "kickoffAt": kickoff(-1)})),
            "EPL",
        );

        let b = board.clone();
        let dropped = tokio::spawn(async move { b.render("past-matches", MatchMode::Past).await });
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(matches!(
            board.panel_state("past-matches", MatchMode::Past),
            RenderState::Loading { .. }
        ));

        // the client went away mid-fetch
        dropped.abort();
        assert!(dropped.await.unwrap_err().is_cancelled());
        assert_eq!(board.panel_state("past-matches", MatchMode::Past), RenderState::Idle);

        let b = board.clone();
        let retry = tokio::spawn(async move { b.render("past-matches", MatchMode::Past).await });
        tokio::time::sleep(Duration::from_millis(150)).await;
        gate.notify_one();
        assert!(matches!(retry.await.unwrap(), RenderOutcome::Rendered(_)));
        assert_eq!(
            board.panel_state("past-matches", MatchMode::Past),
            RenderState::Rendered { league: "EPL".into() }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_triggers_are_coalesced() {
        let (feed, board) = board(
            FakeFeed::new().local(json!({"id": 1, "league": "EPL", "kickoffAt": kickoff(-1)})),
            "EPL",
        );

        let b = board.clone();
        let first = tokio::spawn(async move { b.render("past-matches", MatchMode::Past).await });
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = board.render("past-matches", MatchMode::Past).await;

        assert!(matches!(first.await.unwrap(), RenderOutcome::Coalesced));
        assert!(matches!(second, RenderOutcome::Rendered(_)));
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_league_switch_during_debounce_is_stale() {
        let (feed, board) = board(FakeFeed::new(), "EPL");

        let b = board.clone();
        let pending = tokio::spawn(async move { b.render("past-matches", MatchMode::Past).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        board.switch_league("UCL");

        assert!(matches!(pending.await.unwrap(), RenderOutcome::Stale));
        assert_eq!(feed.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_sets_error_state() {
        let (_, board) = board(FakeFeed::new().failing_local().failing_feed(), "SerieA");

        match board.render("upcoming-matches", MatchMode::Upcoming).await {
            RenderOutcome::Failed(panel) => assert!(panel.error.is_some()),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            board.panel_state("upcoming-matches", MatchMode::Upcoming),
            RenderState::Error { .. }
        ));
    }

    #[test]
    fn test_switch_to_same_league_is_noop() {
        let (_, board) = board(FakeFeed::new(), "EPL");
        assert!(!board.switch_league(" epl "));
        assert_eq!(board.league(), "EPL");
    }
}
