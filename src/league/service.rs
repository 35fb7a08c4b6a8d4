use chrono::{DateTime, Utc};
use futures_util::future::join;
use std::sync::Arc;
use tracing::{debug, warn};

use super::scorers::Scorer;
use super::standings::{build_table, StandingRow};
use super::teams::{merge_league_teams, Team, TeamDirectory, TeamsByLeague};
use crate::error::LoadError;
use crate::feed::LeagueFeed;
use crate::matches::Match;

/// Rosters, tables and scorers for the league pages.
pub struct LeagueData {
    feed: Arc<dyn LeagueFeed>,
}

fn teams_of<'a>(actual: &'a TeamsByLeague, league: &str) -> &'a [Team] {
    let league = league.trim();
    actual
        .get(league)
        .or_else(|| {
            actual
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(league))
                .map(|(_, teams)| teams)
        })
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl LeagueData {
    pub fn new(feed: Arc<dyn LeagueFeed>) -> Self {
        LeagueData { feed }
    }

    /// Feed teams of `league` plus user-created teams of the same league.
    /// User teams are optional; the feed roster is not.
    pub async fn teams(&self, league: &str) -> Result<Vec<Team>, LoadError> {
        let (actual, user) = join(self.feed.actual_teams(), self.feed.user_teams()).await;
        let actual = actual.map_err(|source| LoadError::Unavailable {
            resource: "teams",
            league: league.to_string(),
            source,
        })?;
        let user = user.unwrap_or_else(|e| {
            warn!("User teams unavailable, showing feed teams only: {}", e);
            Vec::new()
        });
        let teams = merge_league_teams(league, teams_of(&actual, league), &user);
        debug!("{}: {} teams ({} user-created)", league, teams.len(), user.len());
        Ok(teams)
    }

    pub async fn directory(&self) -> Result<TeamDirectory, LoadError> {
        let actual = self
            .feed
            .actual_teams()
            .await
            .map_err(|source| LoadError::Unavailable {
                resource: "teams",
                league: "all leagues".to_string(),
                source,
            })?;
        Ok(TeamDirectory::from_actual(&actual))
    }

    /// League table for `league`, counting locally recorded results from
    /// `local` that finished before `now`.
    pub async fn standings(
        &self,
        league: &str,
        local: &[Match],
        now: DateTime<Utc>,
    ) -> Result<Vec<StandingRow>, LoadError> {
        let (remote, roster) = join(self.feed.standings(league), self.teams(league)).await;

        let remote = match remote {
            Ok(payload) => {
                debug!(
                    "{}: {} remote standings (source: {})",
                    league,
                    payload.standings.len(),
                    payload.source.as_deref().unwrap_or("unknown")
                );
                payload.standings
            }
            Err(e) if roster.is_ok() => {
                warn!("Standings feed failed for {}, generating from local results: {}", league, e);
                Vec::new()
            }
            Err(source) => {
                return Err(LoadError::Unavailable {
                    resource: "standings",
                    league: league.to_string(),
                    source,
                })
            }
        };

        let roster = match roster {
            Ok(teams) => teams,
            Err(e) => {
                warn!("No roster for {}, using the remote table's teams: {}", league, e);
                remote
                    .iter()
                    .map(|s| Team {
                        name: s.team_name.clone(),
                        emblem_url: s.team_crest.clone(),
                        league: Some(league.to_string()),
                    })
                    .collect()
            }
        };

        Ok(build_table(&remote, &roster, local, now))
    }

    /// Top scorers in feed order.
    pub async fn scorers(&self, league: &str) -> Result<Vec<Scorer>, LoadError> {
        self.feed
            .scorers(league)
            .await
            .map_err(|source| LoadError::Unavailable {
                resource: "scorers",
                league: league.to_string(),
                source,
            })
    }
}
