//! Per-request condition context.
//!
//! Condition keys in policies are namespaced (`aws:username`,
//! `s3:prefix`); the context stores them without the namespace. Every
//! request header (lower-cased) and query parameter is included as well, so
//! `s3:x-amz-copy-source` or `s3:prefix` resolve without special cases.
//! Headers and parameters named like a key the gateway computes itself are
//! dropped, so the request cannot supply those values.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// The kind of identity behind a request, exposed as `aws:principaltype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalType {
    /// Unsigned request.
    Anonymous,
    /// The root account.
    Account,
    /// A long-lived IAM user.
    User,
    /// Temporary credentials minted by `AssumeRole`.
    AssumedRole,
}

impl PrincipalType {
    /// Context value of the principal type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "Anonymous",
            Self::Account => "Account",
            Self::User => "User",
            Self::AssumedRole => "AssumedRole",
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and auth facts that are not visible in the raw request.
#[derive(Debug, Clone)]
pub struct RequestIdentity<'a> {
    /// Effective user name (parent user for temporary credentials).
    pub username: &'a str,
    /// Access key that signed the request.
    pub user_id: &'a str,
    /// Kind of principal.
    pub principal_type: PrincipalType,
    /// `AWS2` or `AWS4-HMAC-SHA256`; `None` when unsigned.
    pub signature_version: Option<&'a str>,
    /// `REST-HEADER` or `REST-QUERY-STRING`; `None` when unsigned.
    pub auth_type: Option<&'a str>,
    /// Evaluation time, read once per request.
    pub now: DateTime<Utc>,
}

/// Context keys filled from the request identity, never from raw input.
const RESERVED_KEYS: &[&str] = &[
    "CurrentTime",
    "EpochTime",
    "SecureTransport",
    "principaltype",
    "userid",
    "username",
    "UserAgent",
    "Referer",
    "signatureversion",
    "AuthType",
];

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key))
}

/// Build the `key → values` map conditions are evaluated against.
#[must_use]
pub fn build_condition_values(
    parts: &http::request::Parts,
    identity: &RequestIdentity<'_>,
) -> HashMap<String, Vec<String>> {
    let mut values: HashMap<String, Vec<String>> = HashMap::new();

    for (name, value) in &parts.headers {
        if is_reserved(name.as_str()) {
            continue;
        }
        if let Ok(v) = value.to_str() {
            values
                .entry(name.as_str().to_owned())
                .or_default()
                .push(v.to_owned());
        }
    }

    if let Some(query) = parts.uri.query() {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if is_reserved(&key) {
                continue;
            }
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };

    let secure = parts.uri.scheme_str() == Some("https")
        || header("x-forwarded-proto").is_some_and(|p| p.eq_ignore_ascii_case("https"));

    let mut set = |key: &str, value: String| {
        values.insert(key.to_owned(), vec![value]);
    };

    set(
        "CurrentTime",
        identity.now.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    set("EpochTime", identity.now.timestamp().to_string());
    set("SecureTransport", secure.to_string());
    set("principaltype", identity.principal_type.as_str().to_owned());
    set("userid", identity.user_id.to_owned());
    set("username", identity.username.to_owned());
    if let Some(ua) = header("user-agent") {
        set("UserAgent", ua);
    }
    if let Some(referer) = header("referer") {
        set("Referer", referer);
    }
    // Present but empty when unsigned.
    for (key, value) in [
        ("signatureversion", identity.signature_version),
        ("AuthType", identity.auth_type),
    ] {
        values.insert(key.to_owned(), value.map(ToOwned::to_owned).into_iter().collect());
    }

    values
}
