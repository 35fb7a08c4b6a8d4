use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Team as returned by `/api/teams/actual` (grouped by league) and by
/// `/api/teams` (user-created, carrying its own league).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default, alias = "crest")]
    pub emblem_url: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
}

/// league code → teams, as served by `/api/teams/actual`
pub type TeamsByLeague = HashMap<String, Vec<Team>>;

/// Roster shown for a league: feed teams plus user-created teams of that
/// league, deduplicated by name (later entry wins) and sorted by name.
pub fn merge_league_teams(league: &str, feed: &[Team], user: &[Team]) -> Vec<Team> {
    let mut by_name: BTreeMap<String, Team> = BTreeMap::new();
    let user_in_league = user
        .iter()
        .filter(|t| t.league.as_deref().map(str::trim) == Some(league.trim()));
    for team in feed.iter().chain(user_in_league) {
        by_name.insert(team.name.clone(), team.clone());
    }
    let mut teams: Vec<Team> = by_name.into_values().collect();
    teams.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    teams
}

/// Team names known to the feed, used for autocomplete and for validating
/// match forms.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    all: Vec<String>,
    by_league: HashMap<String, Vec<String>>,
}

impl TeamDirectory {
    pub fn from_actual(actual: &TeamsByLeague) -> Self {
        let mut all: BTreeSet<String> = BTreeSet::new();
        let mut by_league = HashMap::new();
        for (league, teams) in actual {
            let mut names: Vec<String> = teams.iter().map(|t| t.name.clone()).collect();
            names.sort();
            names.dedup();
            all.extend(names.iter().cloned());
            by_league.insert(league.clone(), names);
        }
        TeamDirectory {
            all: all.into_iter().collect(),
            by_league,
        }
    }

    /// Names for `league`, or every known name when no league is selected.
    pub fn names(&self, league: Option<&str>) -> &[String] {
        match league.map(str::trim).filter(|l| !l.is_empty()) {
            None => &self.all,
            Some(l) => self.by_league.get(l).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Case-insensitive substring search; an empty query yields nothing.
    pub fn suggest(&self, query: &str, league: Option<&str>) -> Vec<&str> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return vec![];
        }
        self.names(league)
            .iter()
            .filter(|name| name.to_lowercase().contains(&q))
            .map(String::as_str)
            .collect()
    }
}
