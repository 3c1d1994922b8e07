//! Client-side signing that mirrors the verifiers.
//!
//! Used by SDK-less callers and by tests to produce requests the verifiers
//! accept.

use chrono::{DateTime, Utc};
use percent_encoding::utf8_percent_encode;
use s3gate_core::ServiceType;
use sha2::{Digest, Sha256};

use crate::canonical::{
    build_canonical_request, build_canonical_request_with_query, build_signed_headers_string,
    canonical_query_from_pairs, parse_query, uri_encode,
};
use crate::error::AuthError;
use crate::sigv2::{build_string_to_sign_v2, compute_sigv2_signature};
use crate::sigv4::{
    ISO8601_FORMAT, SUPPORTED_ALGORITHM, UNSIGNED_PAYLOAD, build_string_to_sign,
    collect_signed_headers, compute_signature, derive_signing_key,
};

/// Who signs, where, and when.
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    /// Access key ID.
    pub access_key: &'a str,
    /// Secret access key.
    pub secret_key: &'a str,
    /// Region for the credential scope.
    pub region: &'a str,
    /// Service for the credential scope.
    pub service: ServiceType,
    /// Signing time.
    pub time: DateTime<Utc>,
    /// Session token added to presigned queries.
    pub session_token: Option<&'a str>,
}

impl<'a> SigningParams<'a> {
    /// S3 signing parameters at the current time.
    #[must_use]
    pub fn new(access_key: &'a str, secret_key: &'a str, region: &'a str) -> Self {
        Self {
            access_key,
            secret_key,
            region,
            service: ServiceType::S3,
            time: Utc::now(),
            session_token: None,
        }
    }

    /// Sign at a fixed instant.
    #[must_use]
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Sign for another service.
    #[must_use]
    pub fn for_service(mut self, service: ServiceType) -> Self {
        self.service = service;
        self
    }

    /// Attach a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: &'a str) -> Self {
        self.session_token = Some(token);
        self
    }

    fn scope(&self) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            self.time.format("%Y%m%d"),
            self.region,
            self.service.as_str()
        )
    }

    fn signing_key(&self) -> Vec<u8> {
        derive_signing_key(
            self.secret_key,
            &self.time.format("%Y%m%d").to_string(),
            self.region,
            self.service.as_str(),
        )
    }
}

/// Build the `Authorization` header value for a SigV4 header request.
///
/// The request must already carry every header in `signed_headers`; the
/// signing time is taken from `params`, so it must agree with the request's
/// `x-amz-date` or `Date` header.
///
/// # Errors
///
/// Returns [`AuthError::MissingHeader`] if a signed header is absent.
pub fn sign_v4_request(
    parts: &http::request::Parts,
    payload_hash: &str,
    signed_headers: &[&str],
    params: &SigningParams<'_>,
) -> Result<String, AuthError> {
    let header_pairs = collect_signed_headers(parts, signed_headers)?;
    let canonical_request = build_canonical_request(
        parts.method.as_str(),
        parts.uri.path(),
        parts.uri.query().unwrap_or(""),
        &header_pairs,
        signed_headers,
        payload_hash,
    );
    let scope = params.scope();
    let string_to_sign = build_string_to_sign(
        &params.time.format(ISO8601_FORMAT).to_string(),
        &scope,
        &hex::encode(Sha256::digest(canonical_request.as_bytes())),
    );
    let signature = compute_signature(&params.signing_key(), &string_to_sign);

    Ok(format!(
        "{SUPPORTED_ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
        params.access_key,
        build_signed_headers_string(signed_headers)
    ))
}

/// Build the full query string of a SigV4 presigned URL signing `host` only.
///
/// Existing query parameters of `parts` are kept.
///
/// # Errors
///
/// Returns [`AuthError::MissingHeader`] if neither a `host` header nor a URI
/// authority is present.
pub fn presign_v4(
    parts: &http::request::Parts,
    expires_secs: i64,
    params: &SigningParams<'_>,
) -> Result<String, AuthError> {
    let credential = format!("{}/{}", params.access_key, params.scope());
    let timestamp = params.time.format(ISO8601_FORMAT).to_string();
    let expires = expires_secs.to_string();

    let mut pairs = parse_query(parts.uri.query().unwrap_or(""));
    pairs.push(("X-Amz-Algorithm".to_owned(), SUPPORTED_ALGORITHM.to_owned()));
    pairs.push(("X-Amz-Credential".to_owned(), credential));
    pairs.push(("X-Amz-Date".to_owned(), timestamp.clone()));
    pairs.push(("X-Amz-Expires".to_owned(), expires));
    pairs.push(("X-Amz-SignedHeaders".to_owned(), "host".to_owned()));
    if let Some(token) = params.session_token {
        pairs.push(("X-Amz-Security-Token".to_owned(), token.to_owned()));
    }
    let canonical_query =
        canonical_query_from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let header_pairs = collect_signed_headers(parts, &["host"])?;
    let canonical_request = build_canonical_request_with_query(
        parts.method.as_str(),
        parts.uri.path(),
        &canonical_query,
        &header_pairs,
        &["host"],
        UNSIGNED_PAYLOAD,
    );
    let string_to_sign = build_string_to_sign(
        &timestamp,
        &params.scope(),
        &hex::encode(Sha256::digest(canonical_request.as_bytes())),
    );
    let signature = compute_signature(&params.signing_key(), &string_to_sign);

    Ok(format!("{canonical_query}&X-Amz-Signature={signature}"))
}

/// Build the `Authorization` header value for a SigV2 header request.
#[must_use]
pub fn sign_v2_request(parts: &http::request::Parts, access_key: &str, secret_key: &str) -> String {
    let date = if parts.headers.contains_key("x-amz-date") {
        ""
    } else {
        parts
            .headers
            .get(http::header::DATE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    };
    let signature = compute_sigv2_signature(secret_key, &build_string_to_sign_v2(parts, date));
    format!("AWS {access_key}:{signature}")
}

/// Build the full query string of a SigV2 presigned URL expiring at the
/// epoch second `expires_at`.
#[must_use]
pub fn presign_v2(
    parts: &http::request::Parts,
    access_key: &str,
    secret_key: &str,
    expires_at: i64,
) -> String {
    let expires = expires_at.to_string();
    let signature = compute_sigv2_signature(secret_key, &build_string_to_sign_v2(parts, &expires));
    let auth_params = format!(
        "AWSAccessKeyId={}&Expires={expires}&Signature={}",
        uri_encode(access_key),
        utf8_percent_encode(&signature, percent_encoding::NON_ALPHANUMERIC)
    );
    match parts.uri.query() {
        Some(q) if !q.is_empty() => format!("{q}&{auth_params}"),
        _ => auth_params,
    }
}
