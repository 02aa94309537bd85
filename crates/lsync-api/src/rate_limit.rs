// Outbound request pacing.
//
// One limiter is shared by every call issued through a `Client`, so the
// bound applies to aggregate traffic across concurrent reconciliations.

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota};
use tokio_util::sync::CancellationToken;

/// Requests per second when no valid override is supplied.
pub const DEFAULT_RATE_LIMIT_PER_SECOND: NonZeroU32 = NonZeroU32::MIN.saturating_add(1);

/// Limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub per_second: NonZeroU32,
    /// When `false`, [`RateLimiter::wait`] returns immediately.
    pub enabled: bool,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            per_second: DEFAULT_RATE_LIMIT_PER_SECOND,
            enabled: true,
        }
    }
}

impl RateLimit {
    /// Parse a requests-per-second override.
    ///
    /// Absent, non-numeric, zero, and negative values all yield the default.
    pub fn parse_per_second(raw: Option<&str>) -> NonZeroU32 {
        raw.and_then(|s| s.trim().parse::<u32>().ok())
            .and_then(NonZeroU32::new)
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_SECOND)
    }
}

/// Token-bucket gate with burst size 1.
pub struct RateLimiter {
    inner: Option<DefaultDirectRateLimiter>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Returned by [`RateLimiter::wait`] when the caller cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCancelled;

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        let inner = limit.enabled.then(|| {
            let quota = Quota::per_second(limit.per_second).allow_burst(NonZeroU32::MIN);
            governor::RateLimiter::direct(quota)
        });
        Self { inner }
    }

    /// A limiter that never blocks.
    pub fn unlimited() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Block until a token is available or `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), WaitCancelled> {
        let Some(limiter) = &self.inner else {
            return Ok(());
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(WaitCancelled),
            () = limiter.until_ready() => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn malformed_overrides_fall_back_to_default() {
        for raw in [None, Some(""), Some("abc"), Some("0"), Some("-3"), Some("2.5")] {
            assert_eq!(
                RateLimit::parse_per_second(raw),
                DEFAULT_RATE_LIMIT_PER_SECOND,
                "override {raw:?}"
            );
        }
    }

    #[test]
    fn valid_override_is_used() {
        assert_eq!(RateLimit::parse_per_second(Some("10")).get(), 10);
        assert_eq!(RateLimit::parse_per_second(Some(" 7 ")).get(), 7);
    }

    #[tokio::test]
    async fn paces_requests_after_first_token() {
        let limiter = RateLimiter::new(RateLimit {
            per_second: NonZeroU32::new(20).unwrap(),
            enabled: true,
        });
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait(&cancel).await.unwrap();
        }

        // Burst of one: the second and third tokens each wait ~50ms.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn cancelled_wait_returns_error() {
        let limiter = RateLimiter::new(RateLimit {
            per_second: NonZeroU32::MIN,
            enabled: true,
        });
        let cancel = CancellationToken::new();
        limiter.wait(&cancel).await.unwrap();

        cancel.cancel();
        assert_eq!(limiter.wait(&cancel).await, Err(WaitCancelled));
    }

    #[tokio::test]
    async fn disabled_limiter_never_blocks() {
        let limiter = RateLimiter::new(RateLimit {
            per_second: NonZeroU32::MIN,
            enabled: false,
        });
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait(&cancel).await.unwrap();
        }

        assert!(!limiter.is_enabled());
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
