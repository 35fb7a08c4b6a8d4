use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::models::{Match, MatchMode, SourceTag};

/// Decide which panel a match belongs to.
///
/// Feed tags are authoritative: `current_tour` lands in the past panel even
/// when the kickoff is still ahead (rescheduled fixtures inside the current
/// round). Untagged records fall back to the kickoff time, and undated ones
/// to whether a full score is present.
pub fn classify(m: &Match, now: DateTime<Utc>) -> MatchMode {
    if m.has_tag(SourceTag::CurrentTour) {
        return MatchMode::Past;
    }
    if m.has_tag(SourceTag::Upcoming) {
        return MatchMode::Upcoming;
    }
    match m.kickoff_at {
        Some(kickoff) if kickoff < now => MatchMode::Past,
        Some(_) => MatchMode::Upcoming,
        None if m.is_played() => MatchMode::Past,
        None => MatchMode::Upcoming,
    }
}

/// Matches of `league` that belong to the `mode` panel, in display order.
pub fn filter_by_mode(
    matches: &[Match],
    league: &str,
    mode: MatchMode,
    now: DateTime<Utc>,
) -> Vec<Match> {
    let mut out: Vec<Match> = matches
        .iter()
        .filter(|m| m.in_league(league) && classify(m, now) == mode)
        .cloned()
        .collect();
    sort_for_mode(&mut out, mode);
    out
}

/// Past: most recent first. Upcoming: soonest first. Undated records go last
/// and keep their relative order.
pub fn sort_for_mode(matches: &mut [Match], mode: MatchMode) {
    matches.sort_by(|a, b| match (a.kickoff_at, b.kickoff_at) {
        (Some(x), Some(y)) => match mode {
            MatchMode::Past => y.cmp(&x),
            MatchMode::Upcoming => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
