//! Access/secret key pairs and temporary credentials.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{IamError, IamResult};
use crate::token::{ACCESS_KEY_CLAIM, PARENT_CLAIM, generate_jwt};

/// Minimum access key length.
pub const ACCESS_KEY_MIN_LEN: usize = 3;
/// Maximum access key length; generated keys use it.
pub const ACCESS_KEY_MAX_LEN: usize = 20;
/// Minimum secret key length.
pub const SECRET_KEY_MIN_LEN: usize = 8;
/// Maximum secret key length; generated keys use it.
pub const SECRET_KEY_MAX_LEN: usize = 40;

const ALPHA_NUMERIC_TABLE: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Whether a credential may be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Requests signed with the key are accepted.
    #[default]
    Enabled,
    /// Requests signed with the key are refused.
    Disabled,
}

/// Generate a random access key and secret key at maximum length.
///
/// The access key is upper-case alphanumeric. The secret key is base64 of
/// random bytes with `/` replaced by `+`.
#[must_use]
pub fn generate_credentials() -> (String, String) {
    let mut rng = rand::rng();

    let access_key: String = (0..ACCESS_KEY_MAX_LEN)
        .map(|_| char::from(ALPHA_NUMERIC_TABLE[rng.random_range(0..ALPHA_NUMERIC_TABLE.len())]))
        .collect();

    let mut key = [0u8; SECRET_KEY_MAX_LEN];
    rng.fill_bytes(&mut key);
    let mut secret_key = STANDARD.encode(key).replace('/', "+");
    secret_key.truncate(SECRET_KEY_MAX_LEN);

    (access_key, secret_key)
}

/// An access key, its secret, and its lifecycle state.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Public key id.
    pub access_key: String,
    /// Signing secret.
    pub secret_key: String,
    /// Signed session token; set only on temporary credentials.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_token: String,
    /// Expiry; `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Enabled or disabled.
    #[serde(default)]
    pub status: AccountStatus,
    /// User whose policies a temporary credential inherits.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_user: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("expiration", &self.expiration)
            .field("status", &self.status)
            .field("parent_user", &self.parent_user)
            .finish_non_exhaustive()
    }
}

impl Credential {
    /// A long-lived, enabled credential.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> IamResult<Self> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        check_access_key(&access_key)?;
        check_secret_key(&secret_key)?;
        Ok(Self {
            access_key,
            secret_key,
            session_token: String::new(),
            expiration: None,
            status: AccountStatus::Enabled,
            parent_user: String::new(),
        })
    }

    /// Mint a temporary credential with fresh keys.
    ///
    /// `claims` must carry a numeric `exp`; the generated access key is added
    /// as `accessKey` and a `parent` claim becomes the parent user. The
    /// session token is the HS512-signed claims.
    pub fn new_temporary_with_claims(
        mut claims: Map<String, Value>,
        token_secret: &str,
    ) -> IamResult<Self> {
        if token_secret.is_empty() {
            return Err(IamError::InvalidClaims("empty token secret".to_owned()));
        }
        let exp = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| IamError::InvalidClaims("missing numeric exp claim".to_owned()))?;
        let expiration = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| IamError::InvalidClaims(format!("exp {exp} out of range")))?;

        let (access_key, secret_key) = generate_credentials();
        claims.insert(ACCESS_KEY_CLAIM.to_owned(), Value::from(access_key.clone()));
        let parent_user = claims
            .get(PARENT_CLAIM)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let session_token = generate_jwt(&claims, token_secret)?;
        Ok(Self {
            access_key,
            secret_key,
            session_token,
            expiration: Some(expiration),
            status: AccountStatus::Enabled,
            parent_user,
        })
    }

    /// Whether the credential has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| now > exp)
    }

    /// Whether the credential has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether this is an STS credential.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        !self.session_token.is_empty() && self.expiration.is_some()
    }

    /// Enabled, well-formed and unexpired at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == AccountStatus::Enabled
            && check_access_key(&self.access_key).is_ok()
            && check_secret_key(&self.secret_key).is_ok()
            && !self.is_expired_at(now)
    }

    /// Enabled, well-formed and unexpired.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

pub(crate) fn check_access_key(access_key: &str) -> IamResult<()> {
    let len = access_key.len();
    if (ACCESS_KEY_MIN_LEN..=ACCESS_KEY_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(IamError::InvalidAccessKeyLength(len))
    }
}

pub(crate) fn check_secret_key(secret_key: &str) -> IamResult<()> {
    let len = secret_key.len();
    if (SECRET_KEY_MIN_LEN..=SECRET_KEY_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(IamError::InvalidSecretKeyLength(len))
    }
}
