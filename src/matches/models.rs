use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Match identifier as delivered by either source (numeric in practice,
/// but some feeds send it as a string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchId::Number(n) => write!(f, "{}", n),
            MatchId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Temporal tag attached by the external feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Upcoming,
    CurrentTour,
}

impl SourceTag {
    /// Unknown tag strings are ignored rather than rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Some(SourceTag::Upcoming),
            "current_tour" => Some(SourceTag::CurrentTour),
            _ => None,
        }
    }
}

/// Which panel a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Past,
    Upcoming,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Past => f.write_str("past"),
            MatchMode::Upcoming => f.write_str("upcoming"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "past" | "previous" => Ok(MatchMode::Past),
            "upcoming" | "next" => Ok(MatchMode::Upcoming),
            other => Err(format!("unknown match mode '{}'", other)),
        }
    }
}

/// Canonical match record produced from either source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub home_team: String,
    pub away_team: String,
    pub home_crest: Option<String>,
    pub away_crest: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub kickoff_at: Option<DateTime<Utc>>,
    pub league: String,
    pub matchday: Option<u32>,
    /// Sorted, duplicate-free
    #[serde(rename = "apiTags", default)]
    pub tags: Vec<SourceTag>,
    pub is_external: bool,
}

impl Match {
    /// Both score fields present.
    pub fn is_played(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    pub fn has_tag(&self, tag: SourceTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn add_tag(&mut self, tag: SourceTag) {
        if let Err(pos) = self.tags.binary_search(&tag) {
            self.tags.insert(pos, tag);
        }
    }

    pub fn in_league(&self, league: &str) -> bool {
        let ours = self.league.trim();
        let target = league.trim();
        !ours.is_empty() && !target.is_empty() && ours.eq_ignore_ascii_case(target)
    }
}

/// Team reference nested inside external records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamRef {
    pub name: Option<String>,
    pub crest: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScorePair {
    pub home: Option<i32>,
    pub away: Option<i32>,
}

/// Match as served by the season feed endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMatch {
    pub id: MatchId,
    #[serde(default)]
    pub home_team: Option<TeamRef>,
    #[serde(default)]
    pub away_team: Option<TeamRef>,
    #[serde(default)]
    pub score: Option<ScorePair>,
    #[serde(default)]
    pub kickoff_at: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub matchday: Option<u32>,
    #[serde(default)]
    pub api_tags: Vec<String>,
}

/// Envelope used by every `/api/teams/matches/*` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchesEnvelope {
    #[serde(default)]
    pub matches: Vec<ExternalMatch>,
}

/// Match as stored by the local backend (flat team names).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalMatch {
    pub id: MatchId,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub home_team_emblem: Option<String>,
    #[serde(default)]
    pub away_team_emblem: Option<String>,
    #[serde(default)]
    pub home_score: Option<i32>,
    #[serde(default)]
    pub away_score: Option<i32>,
    /// Older records carry "2:1" instead of split scores
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub kickoff_at: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub matchday: Option<u32>,
}

/// A record from either source before normalization.
#[derive(Debug, Clone)]
pub enum SourceMatch {
    Local(LocalMatch),
    External(ExternalMatch),
}

const UNKNOWN_TEAM: &str = "Unknown";

impl SourceMatch {
    pub fn normalize(self) -> Match {
        match self {
            SourceMatch::Local(m) => normalize_local(m),
            SourceMatch::External(m) => normalize_external(m),
        }
    }
}

impl From<LocalMatch> for Match {
    fn from(m: LocalMatch) -> Self {
        SourceMatch::Local(m).normalize()
    }
}

impl From<ExternalMatch> for Match {
    fn from(m: ExternalMatch) -> Self {
        SourceMatch::External(m).normalize()
    }
}

fn normalize_local(m: LocalMatch) -> Match {
    let (home_score, away_score) = match (m.home_score, m.away_score) {
        (None, None) => m
            .score
            .as_deref()
            .and_then(parse_score_line)
            .map(|(h, a)| (Some(h), Some(a)))
            .unwrap_or((None, None)),
        pair => pair,
    };

    let kickoff_at = m
        .kickoff_at
        .as_deref()
        .and_then(parse_kickoff)
        .or_else(|| match (m.date.as_deref(), m.time.as_deref()) {
            (Some(d), Some(t)) => parse_kickoff(&format!("{}T{}", d, t)),
            (Some(d), None) => parse_kickoff(d),
            _ => None,
        });

    Match {
        id: m.id,
        home_team: non_blank(m.home_team).unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
        away_team: non_blank(m.away_team).unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
        home_crest: non_blank(m.home_team_emblem),
        away_crest: non_blank(m.away_team_emblem),
        home_score,
        away_score,
        kickoff_at,
        league: m.league.unwrap_or_default().trim().to_string(),
        matchday: m.matchday,
        tags: Vec::new(),
        is_external: false,
    }
}

fn normalize_external(m: ExternalMatch) -> Match {
    let home = m.home_team.unwrap_or_default();
    let away = m.away_team.unwrap_or_default();
    let score = m.score.unwrap_or_default();

    let mut out = Match {
        id: m.id,
        home_team: non_blank(home.name).unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
        away_team: non_blank(away.name).unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
        home_crest: non_blank(home.crest),
        away_crest: non_blank(away.crest),
        home_score: score.home,
        away_score: score.away,
        kickoff_at: m.kickoff_at.as_deref().and_then(parse_kickoff),
        league: m.league.unwrap_or_default().trim().to_string(),
        matchday: m.matchday,
        tags: Vec::new(),
        is_external: true,
    };
    for tag in m.api_tags.iter().filter_map(|t| SourceTag::parse(t)) {
        out.add_tag(tag);
    }
    out
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// "2:1" / "2 : 1" / "2-1" → (2, 1)
fn parse_score_line(s: &str) -> Option<(i32, i32)> {
    let (home, away) = s.split_once(':').or_else(|| s.split_once('-'))?;
    Some((home.trim().parse().ok()?, away.trim().parse().ok()?))
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a kickoff timestamp. Offset-less values are taken as UTC.
pub fn parse_kickoff(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
