use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::http::ApiClient;
use super::provider::{LeagueFeed, MatchFeed};
use crate::error::FetchError;
use crate::league::{Scorer, ScorersPayload, StandingsPayload, Team, TeamsByLeague};
use crate::matches::{ExternalMatch, LocalMatch, MatchesEnvelope};

/// Match and league data served by the football REST API.
///
/// Feed endpoints (`/api/teams/...`) are asked twice when the first answer is
/// not 2xx; the local `/api/matches` endpoint is asked once.
#[derive(Clone)]
pub struct RestFeed {
    api: ApiClient,
}

impl RestFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(RestFeed {
            api: ApiClient::new(base_url, timeout)?,
        })
    }

    async fn feed_matches(&self, segments: &[&str]) -> Result<Vec<ExternalMatch>, FetchError> {
        let url = self.api.endpoint(segments, &[])?;
        let envelope: MatchesEnvelope = self.api.get_retry_once(&url).await?.json()?;
        debug!("{} returned {} feed matches", url, envelope.matches.len());
        Ok(envelope.matches)
    }
}

#[async_trait]
impl MatchFeed for RestFeed {
    fn name(&self) -> &str {
        "football-rest"
    }

    async fn local_matches(&self, league: Option<&str>) -> Result<Vec<LocalMatch>, FetchError> {
        let query: Vec<(&str, &str)> = league.map(|l| ("league", l)).into_iter().collect();
        let url = self.api.endpoint(&["api", "matches"], &query)?;
        let matches: Vec<LocalMatch> = self.api.get(&url).await?.json()?;
        debug!("{} returned {} local matches", url, matches.len());
        Ok(matches)
    }

    async fn season_matches(&self) -> Result<Vec<ExternalMatch>, FetchError> {
        self.feed_matches(&["api", "teams", "matches", "all"]).await
    }

    async fn upcoming_matches(&self, league: &str) -> Result<Vec<ExternalMatch>, FetchError> {
        self.feed_matches(&["api", "teams", "matches", "upcoming", league])
            .await
    }

    async fn previous_matches(&self, league: &str) -> Result<Vec<ExternalMatch>, FetchError> {
        self.feed_matches(&["api", "teams", "matches", "previous", league])
            .await
    }
}

#[async_trait]
impl LeagueFeed for RestFeed {
    async fn actual_teams(&self) -> Result<TeamsByLeague, FetchError> {
        let url = self.api.endpoint(&["api", "teams", "actual"], &[])?;
        self.api.get_retry_once(&url).await?.json()
    }

    async fn user_teams(&self) -> Result<Vec<Team>, FetchError> {
        let url = self.api.endpoint(&["api", "teams"], &[])?;
        self.api.get_retry_once(&url).await?.json()
    }

    async fn standings(&self, league: &str) -> Result<StandingsPayload, FetchError> {
        let url = self.api.endpoint(&["api", "teams", "standings", league], &[])?;
        let payload: StandingsPayload = self.api.get_retry_once(&url).await?.json()?;
        debug!(
            "Standings for {}: {} rows (source: {})",
            league,
            payload.standings.len(),
            payload.source.as_deref().unwrap_or("unknown")
        );
        Ok(payload)
    }

    async fn scorers(&self, league: &str) -> Result<Vec<Scorer>, FetchError> {
        let url = self.api.endpoint(&["api", "teams", "scorers", league], &[])?;
        let payload: ScorersPayload = self.api.get_retry_once(&url).await?.json()?;
        Ok(payload.scorers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Hits {
        local: Arc<AtomicUsize>,
        upcoming: Arc<AtomicUsize>,
        scorers: Arc<AtomicUsize>,
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn local_ok(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
        let league = q.get("league").cloned().unwrap_or_else(|| "ALL".into());
        Json(serde_json::json!([
            {"id": 1, "homeTeam": "A", "awayTeam": "B", "league": league}
        ]))
    }

    async fn local_down(State(hits): State<Hits>) -> impl IntoResponse {
        hits.local.fetch_add(1, Ordering::SeqCst);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"message": "db down"})))
    }

    /// 503 on the first call, data afterwards.
    async fn upcoming_flaky(
        State(hits): State<Hits>,
        Path(league): Path<String>,
    ) -> axum::response::Response {
        if hits.upcoming.fetch_add(1, Ordering::SeqCst) == 0 {
            return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
        }
        Json(serde_json::json!({
            "matches": [{
                "id": 10,
                "homeTeam": {"name": "Girona"},
                "awayTeam": {"name": "Betis"},
                "league": league,
                "kickoffAt": "2030-01-01T20:00:00Z"
            }]
        }))
        .into_response()
    }

    async fn previous_garbage() -> impl IntoResponse {
        "<html>proxy error</html>"
    }

    async fn scorers_down(State(hits): State<Hits>) -> impl IntoResponse {
        hits.scorers.fetch_add(1, Ordering::SeqCst);
        StatusCode::BAD_GATEWAY
    }

    fn app(hits: Hits, local_fails: bool) -> Router {
        let local = if local_fails {
            get(local_down)
        } else {
            get(local_ok)
        };
        Router::new()
            .route("/api/matches", local)
            .route("/api/teams/matches/upcoming/:league", get(upcoming_flaky))
            .route("/api/teams/matches/previous/:league", get(previous_garbage))
            .route("/api/teams/scorers/:league", get(scorers_down))
            .with_state(hits)
    }

    #[tokio::test]
    async fn test_local_matches_pass_league_query() {
        let base = serve(app(Hits::default(), false)).await;
        let feed = RestFeed::new(&base, Duration::from_secs(5)).unwrap();

        let filtered = feed.local_matches(Some("LaLiga")).await.unwrap();
        assert_eq!(filtered[0].league.as_deref(), Some("LaLiga"));

        let all = feed.local_matches(None).await.unwrap();
        assert_eq!(all[0].league.as_deref(), Some("ALL"));
    }

    #[tokio::test]
    async fn test_local_failure_is_not_retried() {
        let hits = Hits::default();
        let base = serve(app(hits.clone(), true)).await;
        let feed = RestFeed::new(&base, Duration::from_secs(5)).unwrap();

        match feed.local_matches(None).await {
            Err(FetchError::Status { status, message, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "db down");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(hits.local.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_feed_retries_once_after_non_ok() {
        let hits = Hits::default();
        let base = serve(app(hits.clone(), false)).await;
        let feed = RestFeed::new(&base, Duration::from_secs(5)).unwrap();

        let upcoming = feed.upcoming_matches("LaLiga").await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].league.as_deref(), Some("LaLiga"));
        assert_eq!(hits.upcoming.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_failure_is_reported() {
        let hits = Hits::default();
        let base = serve(app(hits.clone(), false)).await;
        let feed = RestFeed::new(&base, Duration::from_secs(5)).unwrap();

        let err = feed.scorers("EPL").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 502, .. }));
        assert_eq!(hits.scorers.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let base = serve(app(Hits::default(), false)).await;
        let feed = RestFeed::new(&base, Duration::from_secs(5)).unwrap();

        let err = feed.previous_matches("EPL").await.unwrap_err();
        match err {
            FetchError::Malformed { message, .. } => assert!(message.contains("proxy error")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let feed = RestFeed::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = feed.season_matches().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
