pub mod http;
pub mod provider;
pub mod rest;

pub use provider::{LeagueFeed, MatchFeed};
pub use rest::RestFeed;
