//! League table: the remote standings enriched with locally recorded
//! results, or a table built from local results alone when the remote one
//! is empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::teams::Team;
use crate::matches::Match;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStanding {
    #[serde(default)]
    pub position: Option<u32>,
    pub team_name: String,
    #[serde(default)]
    pub team_crest: Option<String>,
    #[serde(default)]
    pub played_games: u32,
    #[serde(default)]
    pub won: u32,
    #[serde(default)]
    pub draw: u32,
    #[serde(default)]
    pub lost: u32,
    #[serde(default)]
    pub goals_for: u32,
    #[serde(default)]
    pub goals_against: u32,
    #[serde(default)]
    pub points: u32,
}

/// Body of `/api/teams/standings/{league}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingsPayload {
    #[serde(default)]
    pub standings: Vec<RemoteStanding>,
    /// "api", "cache", "database"... informational only
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub position: u32,
    pub name: String,
    pub emblem_url: Option<String>,
    pub played: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl StandingRow {
    fn empty(name: &str, emblem_url: Option<String>) -> Self {
        StandingRow {
            position: 0,
            name: name.to_string(),
            emblem_url,
            played: 0,
            won: 0,
            draw: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        if scored > conceded {
            self.won += 1;
            self.points += 3;
        } else if scored < conceded {
            self.lost += 1;
        } else {
            self.draw += 1;
            self.points += 1;
        }
    }
}

impl From<&RemoteStanding> for StandingRow {
    fn from(s: &RemoteStanding) -> Self {
        StandingRow {
            position: s.position.unwrap_or(0),
            name: s.team_name.clone(),
            emblem_url: s.team_crest.clone(),
            played: s.played_games,
            won: s.won,
            draw: s.draw,
            lost: s.lost,
            goals_for: s.goals_for,
            goals_against: s.goals_against,
            points: s.points,
        }
    }
}

/// Local results that count towards the table: finished before `now`, fully
/// scored, and between two teams of the league roster.
pub fn countable_results<'a>(
    matches: &'a [Match],
    roster: &[Team],
    now: DateTime<Utc>,
) -> Vec<&'a Match> {
    let in_roster = |name: &str| roster.iter().any(|t| t.name == name);
    matches
        .iter()
        .filter(|m| !m.is_external && m.is_played())
        .filter(|m| m.kickoff_at.is_some_and(|k| k < now))
        .filter(|m| in_roster(&m.home_team) && in_roster(&m.away_team))
        .collect()
}

/// Build the table shown for a league.
///
/// With a non-empty remote table, local results are added on top of it.
/// Otherwise the table is generated from the roster and local results; teams
/// that have not played are dropped unless nobody has played yet.
pub fn build_table(
    remote: &[RemoteStanding],
    roster: &[Team],
    local: &[Match],
    now: DateTime<Utc>,
) -> Vec<StandingRow> {
    let results = countable_results(local, roster, now);

    if !remote.is_empty() {
        let mut rows: Vec<StandingRow> = remote.iter().map(StandingRow::from).collect();
        apply_results(&mut rows, &results);
        rank(&mut rows);
        return rows;
    }

    let mut rows: Vec<StandingRow> = roster
        .iter()
        .map(|t| StandingRow::empty(&t.name, t.emblem_url.clone()))
        .collect();
    if results.is_empty() {
        for (i, row) in rows.iter_mut().enumerate() {
            row.position = i as u32 + 1;
        }
        return rows;
    }
    apply_results(&mut rows, &results);
    rows.retain(|r| r.played > 0);
    rank(&mut rows);
    rows
}

fn apply_results(rows: &mut [StandingRow], results: &[&Match]) {
    let index: HashMap<String, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name.clone(), i))
        .collect();
    for m in results {
        let (Some(home_goals), Some(away_goals)) = (m.home_score, m.away_score) else {
            continue;
        };
        if home_goals < 0 || away_goals < 0 {
            continue;
        }
        let (home_goals, away_goals) = (home_goals as u32, away_goals as u32);
        if let Some(&i) = index.get(&m.home_team) {
            rows[i].record(home_goals, away_goals);
        }
        if let Some(&i) = index.get(&m.away_team) {
            rows[i].record(away_goals, home_goals);
        }
    }
}

/// Points, then goal difference, then goals scored; positions renumbered.
fn rank(rows: &mut [StandingRow]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.position = i as u32 + 1;
    }
}
