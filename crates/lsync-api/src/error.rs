use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

/// Status reported by [`Error::status_code`] when no HTTP response exists.
pub const UNKNOWN_STATUS: i32 = -1;

/// Top-level error type for the `lsync-api` crate.
///
/// Variants split along one line: whether the server answered. `Rejected`
/// and `Deserialization` carry the response status and raw body; every
/// other variant originates below the HTTP layer and reports
/// [`UNKNOWN_STATUS`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Server answered ─────────────────────────────────────────────
    /// Any status other than 200.
    #[error("{method} {url}: status {} ({status}): {body:?}", .status.as_u16())]
    Rejected {
        method: Method,
        url: Url,
        status: StatusCode,
        body: String,
    },

    /// 200 response whose body did not fit the expected shape.
    #[error("{method} {url}: status {} ({status}): {body:?}: {message}", .status.as_u16())]
    Deserialization {
        method: Method,
        url: Url,
        status: StatusCode,
        body: String,
        message: String,
    },

    // ── No response ─────────────────────────────────────────────────
    /// DNS, connect, or I/O failure after the retry budget was spent.
    #[error("{method} failed: {url}: {source}")]
    Transport {
        method: Method,
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// The overall deadline elapsed, retries included.
    #[error("{method} failed: {url}: timed out after {timeout_secs}s")]
    Timeout {
        method: Method,
        url: Url,
        timeout_secs: u64,
    },

    /// The caller's cancellation token fired before a response arrived.
    #[error("{method} {url}: cancelled")]
    Cancelled { method: Method, url: Url },

    // ── Local ───────────────────────────────────────────────────────
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Borrowed view of the HTTP response behind an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse<'a> {
    pub status: StatusCode,
    pub body: &'a str,
}

impl Error {
    /// The response the server sent, if it sent one.
    pub fn http_response(&self) -> Option<HttpResponse<'_>> {
        match self {
            Self::Rejected { status, body, .. } | Self::Deserialization { status, body, .. } => {
                Some(HttpResponse {
                    status: *status,
                    body,
                })
            }
            _ => None,
        }
    }

    /// HTTP status as an integer, or [`UNKNOWN_STATUS`] without a response.
    pub fn status_code(&self) -> i32 {
        self.http_response()
            .map_or(UNKNOWN_STATUS, |resp| i32::from(resp.status.as_u16()))
    }

    /// Returns `true` if the server answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Returns `true` if the credentials or organization were refused.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Rejected { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}
