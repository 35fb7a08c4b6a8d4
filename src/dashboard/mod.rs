pub mod render;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::board::{MatchBoard, RenderOutcome, Sessions};
use crate::error::LoadError;
use crate::league::LeagueData;
use crate::matches::{filter_by_mode, MatchAggregator, MatchMode};

pub struct AppState {
    pub sessions: Arc<Sessions>,
    pub aggregator: Arc<MatchAggregator>,
    pub league: Arc<LeagueData>,
}

type ApiError = (StatusCode, String);

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/league", get(league_handler).post(switch_league_handler))
        .route("/panels/:container/:mode", get(panel_handler))
        .route("/api/matches/:league/:mode", get(matches_handler))
        .route("/api/season", get(season_handler))
        .route("/api/teams/suggest", get(suggest_handler))
        .route("/api/teams/:league", get(teams_handler))
        .route("/api/standings/:league", get(standings_handler))
        .route("/api/scorers/:league", get(scorers_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn load_failed(e: LoadError) -> ApiError {
    warn!("Dashboard load failed: {}", e);
    (StatusCode::BAD_GATEWAY, e.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct SessionQuery {
    #[serde(default)]
    session: String,
}

fn session_board(state: &AppState, session: &str) -> Result<Arc<MatchBoard>, ApiError> {
    state.sessions.board(session).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "missing or malformed session id".to_string(),
        )
    })
}

fn parse_mode(raw: &str) -> Result<MatchMode, ApiError> {
    raw.parse().map_err(|e| (StatusCode::BAD_REQUEST, e))
}

/// Serve the dashboard page with the default league preselected. The page
/// opens its own session on load.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let league = state.sessions.default_league();
    Html(DASHBOARD_HTML.replace(
        "<body>",
        &format!(r#"<body data-league="{}">"#, render::escape_html(league)),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
struct LeagueBody {
    league: String,
}

#[derive(Debug, Serialize)]
struct LeagueSwitched {
    league: String,
    changed: bool,
}

/// GET /api/league?session=
async fn league_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<LeagueBody>, ApiError> {
    let board = session_board(&state, &query.session)?;
    Ok(Json(LeagueBody {
        league: board.league(),
    }))
}

/// POST /api/league?session= {"league": "EPL"}
async fn switch_league_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    Json(body): Json<LeagueBody>,
) -> Result<Json<LeagueSwitched>, ApiError> {
    let board = session_board(&state, &query.session)?;
    let league = body.league.trim();
    if league.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "league must not be empty".into()));
    }
    let changed = board.switch_league(league);
    Ok(Json(LeagueSwitched {
        league: league.to_string(),
        changed,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct PanelQuery {
    #[serde(default)]
    session: String,
    #[serde(default)]
    scores: bool,
}

/// GET /panels/{container}/{mode}?session=&scores=true
///
/// 204 when this trigger was coalesced, already in flight or outdated by a
/// league switch; the page keeps whatever it shows.
async fn panel_handler(
    State(state): State<Arc<AppState>>,
    Path((container, mode)): Path<(String, String)>,
    Query(query): Query<PanelQuery>,
) -> Result<Response, ApiError> {
    let mode = parse_mode(&mode)?;
    let board = session_board(&state, &query.session)?;
    let response = match board.render(&container, mode).await {
        RenderOutcome::Rendered(panel) | RenderOutcome::Failed(panel) => {
            Html(render::render_panel(&panel, query.scores)).into_response()
        }
        RenderOutcome::Coalesced | RenderOutcome::AlreadyLoading | RenderOutcome::Stale => {
            StatusCode::NO_CONTENT.into_response()
        }
    };
    Ok(response)
}

/// GET /api/matches/{league}/{mode}
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Path((league, mode)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let mode = parse_mode(&mode)?;
    let matches = state
        .aggregator
        .league_matches(&league)
        .await
        .map_err(load_failed)?;
    Ok(Json(filter_by_mode(&matches, &league, mode, Utc::now())))
}

/// GET /api/season
async fn season_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .aggregator
        .season_matches()
        .await
        .map(Json)
        .map_err(load_failed)
}

/// GET /api/teams/{league}
async fn teams_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.league.teams(&league).await.map(Json).map_err(load_failed)
}

#[derive(Debug, Default, Deserialize)]
struct SuggestQuery {
    #[serde(default)]
    q: String,
    league: Option<String>,
}

/// GET /api/teams/suggest?q=man&league=EPL
async fn suggest_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let directory = state.league.directory().await.map_err(load_failed)?;
    let names: Vec<String> = directory
        .suggest(&query.q, query.league.as_deref())
        .into_iter()
        .map(String::from)
        .collect();
    Ok(Json(names))
}

/// GET /api/standings/{league}
async fn standings_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let local = state
        .aggregator
        .league_matches(&league)
        .await
        .unwrap_or_else(|e| {
            warn!("No local results for the {} table: {}", league, e);
            Vec::new()
        });
    state
        .league
        .standings(&league, &local, Utc::now())
        .await
        .map(Json)
        .map_err(load_failed)
}

/// GET /api/scorers/{league}
async fn scorers_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.league.scorers(&league).await.map(Json).map_err(load_failed)
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="uk">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Matchboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  select { background: var(--card); color: var(--text); border: 1px solid var(--border); border-radius: 6px; padding: .3rem .6rem; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
  @media (max-width: 768px) { .two-col { grid-template-columns: 1fr; } }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1rem 1.2rem; }
  .matches-section-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: .8rem; }
  .score-toggle-label { color: var(--muted); font-size: .8rem; cursor: pointer; }
  .match-card { border: 1px solid var(--border); border-radius: 8px; padding: .7rem .9rem; margin-bottom: .6rem; }
  .match-header { display: flex; justify-content: space-between; color: var(--muted); font-size: .75rem; margin-bottom: .4rem; }
  .match-badge { margin-left: .5rem; color: var(--accent); }
  .match-content { display: grid; grid-template-columns: 1fr auto 1fr; align-items: center; gap: .6rem; }
  .team { display: flex; align-items: center; gap: .4rem; }
  .team-away { justify-content: flex-end; }
  .team-crest { width: 22px; height: 22px; object-fit: contain; }
  .match-score { font-weight: 700; }
  .empty-content { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .6rem .8rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .55rem .8rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
</style>
</head>
<body>
<header>
  <h1>⚽ Matchboard</h1>
  <select id="league">
    <option value="UCL">⭐ UCL</option>
    <option value="EPL">🏴 EPL</option>
    <option value="LaLiga">🇪🇸 LaLiga</option>
    <option value="Bundesliga">🇩🇪 Bundesliga</option>
    <option value="SerieA">🇮🇹 SerieA</option>
    <option value="Ligue1">🇫🇷 Ligue1</option>
  </select>
</header>

<main>
  <div class="two-col">
    <div class="panel" id="past-matches"></div>
    <div class="panel" id="upcoming-matches"></div>
  </div>
  <div class="two-col">
    <div class="panel">
      <table>
        <thead><tr><th>#</th><th>Команда</th><th>І</th><th>В</th><th>Н</th><th>П</th><th>М</th><th>О</th></tr></thead>
        <tbody id="standings"></tbody>
      </table>
    </div>
    <div class="panel">
      <table>
        <thead><tr><th>Гравець</th><th>Команда</th><th>Голи</th><th>Асисти</th></tr></thead>
        <tbody id="scorers"></tbody>
      </table>
    </div>
  </div>
</main>

<script>
const session = Math.random().toString(36).slice(2) + Date.now().toString(36);
let showScores = false;
const esc = s => String(s ?? '').replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));

async function loadPanel(container, mode) {
  const res = await fetch(`/panels/${container}/${mode}?session=${session}&scores=${showScores}`);
  if (res.status === 200) document.getElementById(container).innerHTML = await res.text();
}

async function loadTables(league) {
  const [standings, scorers] = await Promise.all([
    fetch(`/api/standings/${encodeURIComponent(league)}`),
    fetch(`/api/scorers/${encodeURIComponent(league)}`),
  ]);
  const st = document.getElementById('standings');
  st.innerHTML = standings.ok
    ? (await standings.json()).map(r => `<tr><td>${r.position}</td><td>${esc(r.name)}</td><td>${r.played}</td><td>${r.won}</td><td>${r.draw}</td><td>${r.lost}</td><td>${r.goalsFor}:${r.goalsAgainst}</td><td>${r.points}</td></tr>`).join('')
    : `<tr><td colspan="8" class="empty-content">${esc(await standings.text())}</td></tr>`;
  const sc = document.getElementById('scorers');
  sc.innerHTML = scorers.ok
    ? (await scorers.json()).map(s => `<tr><td>${esc(s.name)}</td><td>${esc(s.teamName)}</td><td>${s.goals}</td><td>${s.assists}</td></tr>`).join('')
    : `<tr><td colspan="4" class="empty-content">${esc(await scorers.text())}</td></tr>`;
}

function loadAll() {
  const league = document.getElementById('league').value;
  loadPanel('past-matches', 'past');
  loadPanel('upcoming-matches', 'upcoming');
  loadTables(league);
}

document.getElementById('league').addEventListener('change', async e => {
  await fetch(`/api/league?session=${session}`, {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({league: e.target.value}),
  });
  loadAll();
});

document.addEventListener('change', e => {
  if (e.target.classList.contains('show-scores')) {
    showScores = e.target.checked;
    loadPanel('past-matches', 'past');
  }
});

(async () => {
  const res = await fetch(`/api/league?session=${session}`);
  const current = res.ok ? (await res.json()).league : document.body.dataset.league;
  document.getElementById('league').value = current || 'EPL';
  loadAll();
})();
setInterval(loadAll, 60000);
</script>
</body>
</html>
"#;
