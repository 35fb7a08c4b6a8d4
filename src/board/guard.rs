//! Per-panel render state machine.
//!
//! Each (container, mode) pair moves `Idle → Loading → {Rendered | Error}`.
//! Every admitted render gets a ticket carrying a generation number; only the
//! ticket whose generation is still current for its key may commit, and only
//! while its league is still the active one. Everything else is discarded,
//! so a slow response for an old league can never overwrite a newer panel.

use std::collections::HashMap;
use tracing::debug;

use crate::matches::MatchMode;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub container: String,
    pub mode: MatchMode,
}

impl RenderKey {
    pub fn new(container: &str, mode: MatchMode) -> Self {
        RenderKey {
            container: container.to_string(),
            mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Loading { league: String, generation: u64 },
    Rendered { league: String },
    Error { league: String, message: String },
}

/// Permission to render one panel for one league.
#[derive(Debug, Clone)]
pub struct RenderTicket {
    key: RenderKey,
    league: String,
    generation: u64,
}

#[derive(Debug)]
pub enum Admission {
    Started(RenderTicket),
    /// Same panel, same league already loading: nothing to do
    AlreadyLoading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Committed,
    Discarded,
}

fn same_league(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[derive(Debug, Default)]
pub struct RenderGuard {
    states: HashMap<RenderKey, RenderState>,
    generation: u64,
}

impl RenderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self, key: &RenderKey) -> RenderState {
        self.states.get(key).cloned().unwrap_or(RenderState::Idle)
    }

    /// Admit a render of `key` for `league`. A render already loading for a
    /// different league is superseded: its ticket can no longer commit.
    pub fn begin(&mut self, key: RenderKey, league: &str) -> Admission {
        if let Some(RenderState::Loading { league: loading, generation }) = self.states.get(&key) {
            if same_league(loading, league) {
                debug!("{:?} already loading {}, skipping", key, league);
                return Admission::AlreadyLoading;
            }
            debug!(
                "{:?}: superseding generation {} ({} -> {})",
                key, generation, loading, league
            );
        }

        self.generation += 1;
        let ticket = RenderTicket {
            key: key.clone(),
            league: league.to_string(),
            generation: self.generation,
        };
        self.states.insert(
            key,
            RenderState::Loading {
                league: league.to_string(),
                generation: self.generation,
            },
        );
        Admission::Started(ticket)
    }

    /// Whether `ticket` is still the live render for its key.
    pub fn is_current(&self, ticket: &RenderTicket) -> bool {
        matches!(
            self.states.get(&ticket.key),
            Some(RenderState::Loading { generation, .. }) if *generation == ticket.generation
        )
    }

    /// Settle a ticket. `outcome` is `Err(message)` when loading failed.
    pub fn finish(
        &mut self,
        ticket: &RenderTicket,
        active_league: &str,
        outcome: Result<(), String>,
    ) -> Completion {
        if !self.is_current(ticket) {
            debug!(
                "{:?}: generation {} for {} was superseded, discarding",
                ticket.key, ticket.generation, ticket.league
            );
            return Completion::Discarded;
        }
        if !same_league(&ticket.league, active_league) {
            debug!(
                "{:?}: league changed {} -> {} while loading, discarding",
                ticket.key, ticket.league, active_league
            );
            self.states.insert(ticket.key.clone(), RenderState::Idle);
            return Completion::Discarded;
        }

        let next = match outcome {
            Ok(()) => RenderState::Rendered {
                league: ticket.league.clone(),
            },
            Err(message) => RenderState::Error {
                league: ticket.league.clone(),
                message,
            },
        };
        self.states.insert(ticket.key.clone(), next);
        Completion::Committed
    }

    /// Give up on a ticket that will never be settled (its request was
    /// dropped). A still-current `Loading` entry goes back to `Idle`.
    pub fn release(&mut self, ticket: &RenderTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        debug!(
            "{:?}: generation {} for {} abandoned, back to idle",
            ticket.key, ticket.generation, ticket.league
        );
        self.states.insert(ticket.key.clone(), RenderState::Idle);
        true
    }

    /// After a league switch: every panel still loading another league goes
    /// back to `Idle`, which invalidates its ticket. Returns how many.
    pub fn release_stale(&mut self, active_league: &str) -> usize {
        let mut released = 0;
        for state in self.states.values_mut() {
            if let RenderState::Loading { league, .. } = state {
                if !same_league(league, active_league) {
                    *state = RenderState::Idle;
                    released += 1;
                }
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RenderKey {
        RenderKey::new("past-matches", MatchMode::Past)
    }

    fn started(a: Admission) -> RenderTicket {
        match a {
            Admission::Started(t) => t,
            Admission::AlreadyLoading => panic!("expected a ticket"),
        }
    }

    #[test]
    fn test_idle_to_rendered() {
        let mut guard = RenderGuard::new();
        assert_eq!(guard.state(&key()), RenderState::Idle);

        let t = started(guard.begin(key(), "EPL"));
        assert!(matches!(guard.state(&key()), RenderState::Loading { .. }));
        assert_eq!(guard.finish(&t, "EPL", Ok(())), Completion::Committed);
        assert_eq!(
            guard.state(&key()),
            RenderState::Rendered { league: "EPL".into() }
        );
    }

    #[test]
    fn test_error_state_keeps_message() {
        let mut guard = RenderGuard::new();
        let t = started(guard.begin(key(), "EPL"));
        assert_eq!(
            guard.finish(&t, "epl", Err("boom".into())),
            Completion::Committed
        );
        assert_eq!(
            guard.state(&key()),
            RenderState::Error {
                league: "EPL".into(),
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_second_trigger_same_league_is_noop() {
        let mut guard = RenderGuard::new();
        let t = started(guard.begin(key(), "EPL"));
        assert!(matches!(guard.begin(key(), "EPL"), Admission::AlreadyLoading));
        assert!(guard.is_current(&t));

        // other mode on the same container is independent
        let other = RenderKey::new("past-matches", MatchMode::Upcoming);
        assert!(matches!(guard.begin(other, "EPL"), Admission::Started(_)));
    }

    #[test]
    fn test_rendered_panel_can_load_again() {
        let mut guard = RenderGuard::new();
        let t = started(guard.begin(key(), "EPL"));
        guard.finish(&t, "EPL", Ok(()));
        let t2 = started(guard.begin(key(), "EPL"));
        assert!(t2.generation > t.generation);
    }

    #[test]
    fn test_release_returns_current_ticket_to_idle() {
        let mut guard = RenderGuard::new();
        let old = started(guard.begin(key(), "EPL"));
        assert!(guard.release(&old));
        assert_eq!(guard.state(&key()), RenderState::Idle);
        assert!(!guard.release(&old));

        // a superseded ticket cannot knock out the live one
        let a = started(guard.begin(key(), "EPL"));
        let b = started(guard.begin(key(), "LaLiga"));
        assert!(!guard.release(&a));
        assert!(guard.is_current(&b));
    }

    #[test]
    fn test_superseded_ticket_is_discarded() {
        let mut guard = RenderGuard::new();
        let old = started(guard.begin(key(), "EPL"));
        let new = started(guard.begin(key(), "LaLiga"));

        assert_eq!(guard.finish(&old, "LaLiga", Ok(())), Completion::Discarded);
        // the newer render is untouched by the stale completion
        assert!(guard.is_current(&new));
        assert_eq!(guard.finish(&new, "LaLiga", Ok(())), Completion::Committed);
    }

    #[test]
    fn test_league_change_mid_flight_returns_to_idle() {
        let mut guard = RenderGuard::new();
        let t = started(guard.begin(key(), "EPL"));
        assert_eq!(guard.finish(&t, "LaLiga", Ok(())), Completion::Discarded);
        assert_eq!(guard.state(&key()), RenderState::Idle);
    }

    #[test]
    fn test_release_stale_invalidates_tickets() {
        let mut guard = RenderGuard::new();
        let past = started(guard.begin(key(), "EPL"));
        let upcoming_key = RenderKey::new("upcoming-matches", MatchMode::Upcoming);
        let upcoming = started(guard.begin(upcoming_key.clone(), "LaLiga"));

        assert_eq!(guard.release_stale("LaLiga"), 1);
        assert_eq!(guard.state(&key()), RenderState::Idle);
        assert!(!guard.is_current(&past));
        assert!(guard.is_current(&upcoming));
        assert_eq!(guard.finish(&past, "EPL", Ok(())), Completion::Discarded);
    }
}
