// Single-request execution with retry and an overall deadline.
//
// One logical request may be attempted several times. Server errors,
// 429s, and connection failures are retried with exponential backoff;
// everything else is handed back untouched. The deadline covers every
// attempt and every backoff sleep.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// Overall deadline for one logical request, retries included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Backoff schedule and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            wait_min: Duration::from_secs(1),
            wait_max: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// 5xx (except 501) and 429 are worth another attempt.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }

    fn is_retryable_error(err: &reqwest::Error) -> bool {
        err.is_connect() || err.is_timeout()
    }

    /// Wait before retry number `attempt` (0-based).
    ///
    /// A server-supplied `Retry-After` wins over the computed schedule.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(wait) = retry_after {
            return wait;
        }
        self.wait_min
            .saturating_mul(2_u32.saturating_pow(attempt))
            .min(self.wait_max)
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything needed to (re)issue one request. Built fresh per call.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Final response of a request, body fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
    retry_after: Option<Duration>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Shared connection pool plus retry policy.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    config: TransportConfig,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build().map_err(Error::ClientBuild)?;
        Ok(Self { http, config })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: TransportConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Execute `req`, retrying transient failures until the deadline.
    ///
    /// Returns whatever status the server finally sent; only failures
    /// that never produced a response surface as errors.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        req: &PreparedRequest,
    ) -> Result<RawResponse, Error> {
        let deadline = self.config.timeout;
        match tokio::time::timeout(deadline, self.execute_with_retry(cancel, req)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                method: req.method.clone(),
                url: req.url.clone(),
                timeout_secs: deadline.as_secs(),
            }),
        }
    }

    async fn execute_with_retry(
        &self,
        cancel: &CancellationToken,
        req: &PreparedRequest,
    ) -> Result<RawResponse, Error> {
        let policy = self.config.retry;
        let mut attempt: u32 = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(req)),
                outcome = self.send_once(req) => outcome,
            };

            let wait = match outcome {
                Ok(resp)
                    if RetryPolicy::is_retryable_status(resp.status)
                        && attempt < policy.max_retries =>
                {
                    let wait = policy.backoff(attempt, resp.retry_after);
                    warn!(
                        method = %req.method,
                        url = %req.url,
                        status = resp.status.as_u16(),
                        attempt,
                        ?wait,
                        "retrying request"
                    );
                    wait
                }
                Ok(resp) => return Ok(resp),
                Err(err)
                    if RetryPolicy::is_retryable_error(&err) && attempt < policy.max_retries =>
                {
                    let wait = policy.backoff(attempt, None);
                    warn!(
                        method = %req.method,
                        url = %req.url,
                        error = %err,
                        attempt,
                        ?wait,
                        "retrying request"
                    );
                    wait
                }
                Err(source) => {
                    return Err(Error::Transport {
                        method: req.method.clone(),
                        url: req.url.clone(),
                        source,
                    });
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(req)),
                () = tokio::time::sleep(wait) => {}
            }
            attempt += 1;
        }
    }

    async fn send_once(&self, req: &PreparedRequest) -> Result<RawResponse, reqwest::Error> {
        debug!("{} {}", req.method, req.url);

        let mut builder = self
            .http
            .request(req.method.clone(), req.url.clone())
            .headers(req.headers.clone());
        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let retry_after = retry_after(status, resp.headers());
        let body = resp.bytes().await?;

        Ok(RawResponse {
            status,
            body,
            retry_after,
        })
    }
}

fn cancelled(req: &PreparedRequest) -> Error {
    Error::Cancelled {
        method: req.method.clone(),
        url: req.url.clone(),
    }
}

/// Seconds-form `Retry-After`, honoured only on 429 and 503.
fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
