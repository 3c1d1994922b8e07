//! Per-request verification parameters.

use chrono::{DateTime, Duration, Utc};
use s3gate_core::ServiceType;

/// Default tolerated distance between a request's signing time and now.
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: i64 = 15 * 60;

/// What a verifier checks a request against.
///
/// `now` is read once when the context is built so every time check for a
/// request sees the same instant. Tests pin it with [`VerifyContext::with_now`].
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use s3gate_auth::VerifyContext;
/// use s3gate_core::ServiceType;
///
/// let now = Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap();
/// let ctx = VerifyContext::new(ServiceType::S3, "us-east-1").with_now(now);
/// assert_eq!(ctx.now, now);
/// ```
#[derive(Debug, Clone)]
pub struct VerifyContext {
    /// Service the endpoint belongs to.
    pub service: ServiceType,
    /// Region the gateway serves. Empty accepts any region.
    pub region: String,
    /// Maximum tolerated clock skew for header-signed requests.
    pub max_clock_skew: Duration,
    /// The instant the request is checked at.
    pub now: DateTime<Utc>,
}

impl VerifyContext {
    /// Create a context for `service` in `region` at the current time.
    #[must_use]
    pub fn new(service: ServiceType, region: impl Into<String>) -> Self {
        Self {
            service,
            region: region.into(),
            max_clock_skew: Duration::seconds(DEFAULT_MAX_CLOCK_SKEW_SECS),
            now: Utc::now(),
        }
    }

    /// Pin the verification instant.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Override the tolerated clock skew.
    #[must_use]
    pub fn with_max_clock_skew(mut self, skew: Duration) -> Self {
        self.max_clock_skew = skew;
        self
    }
}
