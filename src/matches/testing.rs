//! In-memory [`MatchFeed`] for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::FetchError;
use crate::feed::MatchFeed;
use crate::matches::{ExternalMatch, LocalMatch};

#[derive(Default)]
pub struct FakeFeed {
    local: Vec<Value>,
    upcoming: Vec<Value>,
    previous: Vec<Value>,
    season: Vec<Value>,
    fail_local: bool,
    fail_feed: bool,
    /// Local fetches for this league wait until notified
    gate: Option<(String, Arc<Notify>)>,
    calls: AtomicUsize,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(mut self, v: Value) -> Self {
        self.local.push(v);
        self
    }

    pub fn upcoming(mut self, v: Value) -> Self {
        self.upcoming.push(v);
        self
    }

    pub fn previous(mut self, v: Value) -> Self {
        self.previous.push(v);
        self
    }

    pub fn season(mut self, v: Value) -> Self {
        self.season.push(v);
        self
    }

    pub fn failing_local(mut self) -> Self {
        self.fail_local = true;
        self
    }

    pub fn failing_feed(mut self) -> Self {
        self.fail_feed = true;
        self
    }

    pub fn gated(mut self, league: &str, gate: Arc<Notify>) -> Self {
        self.gate = Some((league.to_string(), gate));
        self
    }

    /// Number of feed calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn down(what: &str) -> FetchError {
        FetchError::Status {
            url: format!("fake://{}", what),
            status: 503,
            message: "down".into(),
        }
    }

    fn in_league(values: &[Value], league: Option<&str>) -> Vec<Value> {
        values
            .iter()
            .filter(|v| match league {
                None => true,
                Some(l) => v["league"]
                    .as_str()
                    .is_some_and(|x| x.eq_ignore_ascii_case(l)),
            })
            .cloned()
            .collect()
    }

    fn decode<T: serde::de::DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("fixture must decode"))
            .collect()
    }
}

#[async_trait]
impl MatchFeed for FakeFeed {
    fn name(&self) -> &str {
        "fake"
    }

    async fn local_matches(&self, league: Option<&str>) -> Result<Vec<LocalMatch>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let (Some((gated, gate)), Some(l)) = (&self.gate, league) {
            if gated.eq_ignore_ascii_case(l) {
                gate.notified().await;
            }
        }
        if self.fail_local {
            return Err(Self::down("local"));
        }
        Ok(Self::decode(Self::in_league(&self.local, league)))
    }

    async fn season_matches(&self) -> Result<Vec<ExternalMatch>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_feed {
            return Err(Self::down("season"));
        }
        Ok(Self::decode(self.season.clone()))
    }

    async fn upcoming_matches(&self, league: &str) -> Result<Vec<ExternalMatch>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_feed {
            return Err(Self::down("upcoming"));
        }
        Ok(Self::decode(Self::in_league(&self.upcoming, Some(league))))
    }

    async fn previous_matches(&self, league: &str) -> Result<Vec<ExternalMatch>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_feed {
            return Err(Self::down("previous"));
        }
        Ok(Self::decode(Self::in_league(&self.previous, Some(league))))
    }
}
