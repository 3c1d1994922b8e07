//! Gateway configuration.
//!
//! Provides [`GateConfig`] for configuring the authentication and
//! authorization engine. Values are loaded from environment variables and
//! fall back to development defaults.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{AwsRegion, GateError, GateResult};

const ACCESS_KEY_MIN_LEN: usize = 3;
const ACCESS_KEY_MAX_LEN: usize = 20;
const SECRET_KEY_MIN_LEN: usize = 8;
const SECRET_KEY_MAX_LEN: usize = 40;

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use s3gate_core::GateConfig;
///
/// let config = GateConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// assert_eq!(config.max_clock_skew_secs, 900);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GateConfig {
    /// Region requests must be scoped to. Empty disables the region check.
    #[builder(default = String::from(AwsRegion::DEFAULT))]
    pub region: String,

    /// Access key of the root (owner) account.
    #[builder(default = String::from("s3gateadmin"))]
    pub root_access_key: String,

    /// Secret key of the root account. Also signs session tokens.
    #[builder(default = String::from("s3gateadmin"))]
    pub root_secret_key: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Maximum tolerated distance between a request's signing time and now.
    #[builder(default = 900)]
    pub max_clock_skew_secs: i64,

    /// Lifetime of credentials minted by `AssumeRole` without `DurationSeconds`.
    #[builder(default = 3600)]
    pub sts_default_duration_secs: i64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            region: String::from(AwsRegion::DEFAULT),
            root_access_key: String::from("s3gateadmin"),
            root_secret_key: String::from("s3gateadmin"),
            log_level: String::from("info"),
            max_clock_skew_secs: 900,
            sts_default_duration_secs: 3600,
        }
    }
}

impl GateConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3GATE_REGION` | `us-east-1` |
    /// | `S3GATE_ROOT_USER` | `s3gateadmin` |
    /// | `S3GATE_ROOT_PASSWORD` | `s3gateadmin` |
    /// | `LOG_LEVEL` | `info` |
    /// | `S3GATE_MAX_CLOCK_SKEW` | `900` |
    /// | `S3GATE_STS_DURATION` | `3600` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3GATE_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("S3GATE_ROOT_USER") {
            config.root_access_key = v;
        }
        if let Ok(v) = std::env::var("S3GATE_ROOT_PASSWORD") {
            config.root_secret_key = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("S3GATE_MAX_CLOCK_SKEW") {
            if let Ok(n) = v.parse::<i64>() {
                config.max_clock_skew_secs = n;
            }
        }
        if let Ok(v) = std::env::var("S3GATE_STS_DURATION") {
            if let Ok(n) = v.parse::<i64>() {
                config.sts_default_duration_secs = n;
            }
        }

        tracing::info!(
            region = %config.region,
            root_access_key = %config.root_access_key,
            "loaded gateway configuration"
        );

        config
    }

    /// The configured region as a typed value.
    #[must_use]
    pub fn aws_region(&self) -> AwsRegion {
        AwsRegion::new(self.region.clone())
    }

    /// Check that the root credential satisfies the key length bounds.
    pub fn validate(&self) -> GateResult<()> {
        let ak_len = self.root_access_key.len();
        if !(ACCESS_KEY_MIN_LEN..=ACCESS_KEY_MAX_LEN).contains(&ak_len) {
            return Err(GateError::Config(format!(
                "root access key must be {ACCESS_KEY_MIN_LEN}-{ACCESS_KEY_MAX_LEN} characters, got {ak_len}"
            )));
        }
        let sk_len = self.root_secret_key.len();
        if !(SECRET_KEY_MIN_LEN..=SECRET_KEY_MAX_LEN).contains(&sk_len) {
            return Err(GateError::Config(format!(
                "root secret key must be {SECRET_KEY_MIN_LEN}-{SECRET_KEY_MAX_LEN} characters, got {sk_len}"
            )));
        }
        if self.max_clock_skew_secs < 0 {
            return Err(GateError::Config(
                "max clock skew must be non-negative".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = GateConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.root_access_key, "s3gateadmin");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_clock_skew_secs, 900);
        assert_eq!(config.sts_default_duration_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = GateConfig::builder()
            .region("eu-west-1".into())
            .root_access_key("admin".into())
            .root_secret_key("supersecret".into())
            .max_clock_skew_secs(60)
            .build();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.aws_region().as_str(), "eu-west-1");
        assert_eq!(config.root_access_key, "admin");
        assert_eq!(config.max_clock_skew_secs, 60);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_reject_short_root_secret() {
        let config = GateConfig::builder().root_secret_key("short".into()).build();
        assert!(matches!(config.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn test_should_reject_long_root_access_key() {
        let config = GateConfig::builder()
            .root_access_key("A".repeat(21))
            .build();
        assert!(matches!(config.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&GateConfig::default()).expect("test serialization");
        assert!(json.contains("rootAccessKey"));
        assert!(json.contains("maxClockSkewSecs"));
    }

    #[test]
    fn test_should_load_from_env() {
        let config = GateConfig::from_env();
        assert!(!config.root_access_key.is_empty());
    }
}
