//! HTTP transport layer
//!
//! A [`Transport`] issues a single HTTP request and returns the raw status
//! and body; [`RetryingTransport`] wraps one with bounded exponential
//! backoff for rate-limited (429) responses. Endpoint clients map non-2xx
//! statuses to typed errors via [`ApiResponse::ensure_success`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

/// Total attempts for a rate-limited request (initial call plus retries)
const MAX_ATTEMPTS: u32 = 3;

/// Upper bound of the random jitter added to each backoff wait, in ms
const JITTER_MS: u64 = 1000;

/// Errors from the HTTP layer and the endpoint clients built on it
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Rate-limit retries were exhausted
    #[error("El servicio está ocupado (Rate Limit). Por favor espera un momento e intenta nuevamente.")]
    RateLimited,

    /// The endpoint answered with a non-2xx status
    #[error("Error fetching {endpoint}: {reason}")]
    Fetch {
        endpoint: &'static str,
        reason: String,
    },

    /// The endpoint answered 2xx but the body could not be decoded
    #[error("Failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A fully-formed request descriptor
///
/// `Clone` so that a retry resends the exact same request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub json_body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a GET request for the given URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json_body: None,
        }
    }

    /// Creates a POST request carrying a JSON body
    pub fn post(url: impl Into<String>, json_body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json_body: Some(json_body),
        }
    }

    /// Appends a query-string pair
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Appends a header
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Raw response from a transport
///
/// Any HTTP status is an `Ok` at this level; only connectivity failures
/// surface as errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Maps a non-2xx status to a [`ApiError::Fetch`] for the given endpoint
    pub fn ensure_success(self, endpoint: &'static str) -> Result<ApiResponse, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Fetch {
                endpoint,
                reason: status_reason(self.status),
            })
        }
    }
}

/// Human-readable status text, e.g. "Too Many Requests"
fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Issues a single HTTP request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        (**self).send(request).await
    }
}

/// [`Transport`] over a shared reqwest client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default reqwest client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self.client.request(request.method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(url = %request.url, status = %status, "request completed");

        Ok(ApiResponse { status, body })
    }
}

/// Base backoff before resending after the `attempt`-th rate-limited
/// response (0-indexed): 2s, then 4s. Jitter is added by the retry loop.
pub fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt + 1)))
}

/// Wraps a transport with bounded exponential backoff for 429 responses
///
/// Any non-429 response, success or failure, is returned immediately;
/// retrying is strictly scoped to rate limiting. After three rate-limited
/// attempts the request fails with [`ApiError::RateLimited`].
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    max_attempts: u32,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut rate_limited = 0;
        loop {
            let response = self.inner.send(request.clone()).await?;
            if response.status != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            rate_limited += 1;
            if rate_limited >= self.max_attempts {
                warn!(url = %request.url, "rate-limit retries exhausted");
                return Err(ApiError::RateLimited);
            }

            let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
            let wait = retry_backoff(rate_limited - 1) + Duration::from_millis(jitter);
            debug!(
                url = %request.url,
                attempt = rate_limited,
                wait_ms = wait.as_millis() as u64,
                "rate limited, backing off"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for tests: pops queued responses in order and
    //! records every request with its (tokio) arrival time.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
        requests: Mutex<Vec<(ApiRequest, Instant)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Queues a response with the given status and body
        pub fn push_status(&self, status: u16, body: &str) {
            let status = StatusCode::from_u16(status).expect("valid status code");
            self.responses.lock().push_back(Ok(ApiResponse {
                status,
                body: body.to_string(),
            }));
        }

        /// Queues a 200 response with the given body
        pub fn push_ok(&self, body: &str) {
            self.push_status(200, body);
        }

        /// Queues an error, e.g. a simulated endpoint failure
        pub fn push_error(&self, error: ApiError) {
            self.responses.lock().push_back(Err(error));
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().iter().map(|(r, _)| r.clone()).collect()
        }

        pub fn request_times(&self) -> Vec<Instant> {
            self.requests.lock().iter().map(|(_, t)| *t).collect()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
            self.requests.lock().push((request, Instant::now()));
            self.responses
                .lock()
                .pop_front()
                .expect("MockTransport: no response queued")
        }
    }
}
