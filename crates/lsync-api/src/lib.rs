// lsync-api: Async Rust client for the Lightstep public API
//
// Request path: Client → envelope encode → RateLimiter::wait →
// Transport::execute → envelope decode / error classification.

pub mod client;
pub mod envelope;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod transport;

pub use client::{Client, ClientIdentity, ClientOptions, DEFAULT_USER_AGENT};
pub use envelope::Envelope;
pub use error::{Error, HttpResponse, UNKNOWN_STATUS};
pub use rate_limit::{RateLimit, RateLimiter};
pub use transport::{RetryPolicy, Transport, TransportConfig};

// Re-exported so downstream crates name HTTP types without a direct
// dependency on reqwest or tokio-util.
pub use reqwest::{Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
