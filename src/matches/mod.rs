pub mod aggregator;
pub mod cache;
pub mod filter;
pub mod merge;
pub mod models;

#[cfg(test)]
pub mod testing;

pub use aggregator::MatchAggregator;
pub use filter::filter_by_mode;
pub use models::{ExternalMatch, LocalMatch, Match, MatchMode, MatchesEnvelope};
#[cfg(test)]
pub use models::MatchId;

/// League codes used by the backend.
pub const KNOWN_LEAGUES: &[&str] = &["UCL", "EPL", "LaLiga", "Bundesliga", "SerieA", "Ligue1"];
