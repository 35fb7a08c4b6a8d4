use thiserror::Error;

/// Failure of a single request against the football REST API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, body read)
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// The body was not the JSON shape we expected
    #[error("unexpected payload from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("cannot build endpoint URL from {0}")]
    InvalidUrl(String),
}

/// Failure of an aggregated load that combines several requests.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("every match source failed for {league} ({failures} request(s))")]
    AllSourcesFailed { league: String, failures: usize },

    #[error("{resource} unavailable for {league}: {source}")]
    Unavailable {
        resource: &'static str,
        league: String,
        #[source]
        source: FetchError,
    },
}
