//! Outbound HTTP.
//!
//! The executor talks to upstreams only through the [`Fetcher`] trait so the
//! fallback chain can be exercised without a network. [`HttpFetcher`] is the
//! `reqwest`-backed implementation used in production.

use crate::error::LookupError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("whois-lookup/", env!("CARGO_PKG_VERSION"));

/// `Accept` header: RDAP first, generic JSON for aggregators.
pub const ACCEPT: &str = "application/rdap+json, application/json";

/// One outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Extra headers on top of the fetcher's defaults
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new<B: Into<Vec<u8>>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a call produced no HTTP status at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport gave up waiting on its own
    #[error("request timed out")]
    Timeout,

    /// DNS, connect, TLS or body read failure
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request could not be built (bad URL or header)
    #[error("invalid request: {0}")]
    Request(String),
}

/// Issues GET requests on behalf of the executor.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// `reqwest`-backed [`Fetcher`].
#[derive(Clone)]
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the standard headers.
    ///
    /// No client-wide timeout is set; each call is bounded by its source.
    pub fn new() -> Result<Self, LookupError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(ACCEPT),
        );

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LookupError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Wrap an already configured client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let mut builder = self.http_client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_reqwest_error)?;

        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::Request(err.to_string())
    } else {
        TransportError::Connect(err.to_string())
    }
}

/// A parsed 2xx body with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub source: String,
    pub url: String,
    pub http_status: u16,
    pub fetched_at: DateTime<Utc>,
    pub body: Value,
}

/// Run `future` for at most `limit`.
///
/// Returns `None` when the limit elapses first. The future is dropped in
/// that case, which cancels the in-flight call and releases its connection.
pub async fn call_with_timeout<F, T>(limit: Duration, future: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, future).await.ok()
}
