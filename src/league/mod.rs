pub mod scorers;
pub mod service;
pub mod standings;
pub mod teams;

pub use scorers::{Scorer, ScorersPayload};
pub use service::LeagueData;
pub use standings::StandingsPayload;
pub use teams::{Team, TeamsByLeague};
#[cfg(test)]
pub use standings::RemoteStanding;
