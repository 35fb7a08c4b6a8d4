use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

/// Body of an API response. Bodies that fail to parse as JSON are kept as
/// raw text so callers can still surface them.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Empty,
    Json(serde_json::Value),
    Raw(String),
}

impl ApiBody {
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return ApiBody::Empty;
        }
        match serde_json::from_str(&text) {
            Ok(v) => ApiBody::Json(v),
            Err(_) => ApiBody::Raw(text),
        }
    }

    /// Human-readable message from an error payload
    /// (`detail`, `message`, `error`, or the raw text).
    pub fn error_message(&self) -> Option<String> {
        match self {
            ApiBody::Empty => None,
            ApiBody::Raw(text) => Some(text.trim().to_string()),
            ApiBody::Json(v) => ["detail", "message", "error"]
                .iter()
                .find_map(|k| v[*k].as_str())
                .map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: ApiBody,
}

impl ApiResponse {
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Decode a successful JSON body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        if !self.ok() {
            let message = self.body.error_message().unwrap_or_else(|| {
                self.status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(FetchError::Status {
                url: self.url,
                status: self.status.as_u16(),
                message,
            });
        }
        match self.body {
            ApiBody::Json(v) => serde_json::from_value(v).map_err(|e| FetchError::Malformed {
                url: self.url,
                message: e.to_string(),
            }),
            ApiBody::Raw(text) => Err(FetchError::Malformed {
                url: self.url,
                message: format!("not JSON: {}", truncate(&text, 120)),
            }),
            ApiBody::Empty => Err(FetchError::Malformed {
                url: self.url,
                message: "empty body".to_string(),
            }),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Thin JSON-over-HTTP client for the football REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL {}", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL {} cannot carry a path", base_url);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { http, base })
    }

    /// Base URL joined with percent-encoded path segments and query pairs.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn get(&self, url: &Url) -> Result<ApiResponse, FetchError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        let text = resp.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(ApiResponse {
            url: url.to_string(),
            status,
            body: ApiBody::from_text(text),
        })
    }

    /// GET that repeats once when the first answer is not 2xx. The backend
    /// may serve a cached copy on the second attempt. Transport failures are
    /// not repeated.
    pub async fn get_retry_once(&self, url: &Url) -> Result<ApiResponse, FetchError> {
        let first = self.get(url).await?;
        if first.ok() {
            return Ok(first);
        }
        warn!("{} answered {}, retrying once", url, first.status);
        self.get(url).await
    }
}
