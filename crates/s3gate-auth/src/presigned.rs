//! Presigned URL verification for AWS Signature Version 4.
//!
//! Presigned URLs carry authentication in query parameters:
//!
//! - `X-Amz-Algorithm` - must be `AWS4-HMAC-SHA256`
//! - `X-Amz-Credential` - `AKID/date/region/service/aws4_request`
//! - `X-Amz-Date` - ISO 8601 basic format timestamp (`YYYYMMDDTHHMMSSZ`)
//! - `X-Amz-Expires` - validity in seconds, `0..=604800`
//! - `X-Amz-SignedHeaders` - semicolon-separated signed header names
//! - `X-Amz-Signature` - the hex-encoded signature
//! - `X-Amz-Content-Sha256` - optional payload hash, else `UNSIGNED-PAYLOAD`

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonical::{build_canonical_request_with_query, canonical_query_from_pairs, parse_query};
use crate::context::VerifyContext;
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::scope::CredentialScope;
use crate::sigv4::{
    AuthResult, SUPPORTED_ALGORITHM, UNSIGNED_PAYLOAD, build_string_to_sign, check_scope_date,
    collect_signed_headers, compute_signature, derive_signing_key, ensure_host_signed,
    parse_iso8601, signatures_match, split_signed_headers,
};

/// Longest validity a presigned URL may request: seven days.
pub const MAX_PRESIGN_EXPIRES_SECS: i64 = 7 * 24 * 60 * 60;

const REQUIRED_PARAMS: &[&str] = &[
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Signature",
    "X-Amz-Date",
    "X-Amz-SignedHeaders",
    "X-Amz-Expires",
];

/// Parsed components from presigned URL query parameters.
#[derive(Debug, Clone)]
pub struct ParsedPresignedParams {
    /// The validated credential scope.
    pub scope: CredentialScope,
    /// The signing time.
    pub signed_at: DateTime<Utc>,
    /// The ISO 8601 timestamp as sent.
    pub timestamp: String,
    /// The URL validity in seconds.
    pub expires: i64,
    /// The list of signed header names.
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
    /// Payload hash for the canonical request.
    pub payload_hash: String,
}

/// Parse presigned URL query parameters into their components.
///
/// # Errors
///
/// Checks run in this order:
/// - [`AuthError::MissingQueryParam`] if any required parameter is absent
/// - [`AuthError::InvalidQuerySignatureAlgo`] for another algorithm
/// - a scope error from [`CredentialScope::parse`]
/// - [`AuthError::MalformedPresignedDate`] for an unparsable `X-Amz-Date`
/// - [`AuthError::MalformedExpires`], [`AuthError::NegativeExpires`] and
///   [`AuthError::MaximumExpires`] for a bad `X-Amz-Expires`
/// - [`AuthError::UnsignedHeaders`] when `host` is not signed
pub fn parse_presigned_params(
    params: &BTreeMap<String, String>,
    ctx: &VerifyContext,
) -> Result<ParsedPresignedParams, AuthError> {
    if let Some(missing) = REQUIRED_PARAMS.iter().find(|p| !params.contains_key(**p)) {
        return Err(AuthError::MissingQueryParam((*missing).to_owned()));
    }
    let param = |name: &str| params.get(name).map(String::as_str).unwrap_or_default();

    let algorithm = param("X-Amz-Algorithm");
    if algorithm != SUPPORTED_ALGORITHM {
        return Err(AuthError::InvalidQuerySignatureAlgo(algorithm.to_owned()));
    }

    let scope = CredentialScope::parse(param("X-Amz-Credential"), ctx.service, &ctx.region)?;

    let timestamp = param("X-Amz-Date");
    let signed_at = parse_iso8601(timestamp).ok_or(AuthError::MalformedPresignedDate)?;
    check_scope_date(&scope, signed_at)?;

    let expires: i64 = param("X-Amz-Expires")
        .parse()
        .map_err(|_| AuthError::MalformedExpires)?;
    if expires < 0 {
        return Err(AuthError::NegativeExpires);
    }
    if expires > MAX_PRESIGN_EXPIRES_SECS {
        return Err(AuthError::MaximumExpires);
    }

    let signed_headers = split_signed_headers(param("X-Amz-SignedHeaders"));
    let signed_refs: Vec<&str> = signed_headers.iter().map(String::as_str).collect();
    ensure_host_signed(&signed_refs)?;

    let payload_hash = params
        .get("X-Amz-Content-Sha256")
        .cloned()
        .unwrap_or_else(|| UNSIGNED_PAYLOAD.to_owned());

    Ok(ParsedPresignedParams {
        scope,
        signed_at,
        timestamp: timestamp.to_owned(),
        expires,
        signed_headers,
        signature: param("X-Amz-Signature").to_owned(),
        payload_hash,
    })
}

/// Verify a presigned URL request.
///
/// A URL is valid from its signing time (less the tolerated skew) through
/// `X-Amz-Date + X-Amz-Expires` inclusive.
///
/// # Errors
///
/// Any error from [`parse_presigned_params`], then
/// [`AuthError::RequestNotReadyYet`], [`AuthError::RequestExpired`], a
/// credential lookup error, a missing signed header, or
/// [`AuthError::SignatureDoesNotMatch`].
pub fn verify_presigned(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
    ctx: &VerifyContext,
) -> Result<AuthResult, AuthError> {
    let pairs = parse_query(parts.uri.query().unwrap_or(""));
    let params: BTreeMap<String, String> = pairs.iter().cloned().collect();
    let parsed = parse_presigned_params(&params, ctx)?;
    let scope = &parsed.scope;

    debug!(
        access_key_id = %scope.access_key_id,
        date = %scope.date,
        region = %scope.region,
        expires = parsed.expires,
        "Verifying presigned URL"
    );

    check_validity_window(parsed.signed_at, parsed.expires, ctx)?;

    let secret_key = credential_provider.get_secret_key(&scope.access_key_id)?;

    let canonical_query = canonical_query_from_pairs(
        pairs
            .iter()
            .filter(|(k, _)| k != "X-Amz-Signature")
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    let signed_header_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let header_pairs = collect_signed_headers(parts, &signed_header_refs)?;

    let canonical_request = build_canonical_request_with_query(
        parts.method.as_str(),
        parts.uri.path(),
        &canonical_query,
        &header_pairs,
        &signed_header_refs,
        &parsed.payload_hash,
    );

    debug!(canonical_request, "Built presigned canonical request");

    let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    let string_to_sign =
        build_string_to_sign(&parsed.timestamp, &scope.to_scope_string(), &canonical_hash);

    let signing_key = derive_signing_key(
        &secret_key,
        &scope.date,
        &scope.region,
        scope.service.as_str(),
    );
    let expected_signature = compute_signature(&signing_key, &string_to_sign);
    signatures_match(&expected_signature, &parsed.signature)?;

    debug!(access_key_id = %scope.access_key_id, "Presigned URL verification succeeded");
    Ok(AuthResult {
        access_key_id: scope.access_key_id.clone(),
        region: scope.region.clone(),
        service: scope.service.as_str().to_owned(),
        signed_headers: parsed.signed_headers,
    })
}

fn check_validity_window(
    signed_at: DateTime<Utc>,
    expires: i64,
    ctx: &VerifyContext,
) -> Result<(), AuthError> {
    if signed_at > ctx.now + ctx.max_clock_skew {
        return Err(AuthError::RequestNotReadyYet);
    }
    if ctx.now > signed_at + Duration::seconds(expires) {
        return Err(AuthError::RequestExpired);
    }
    Ok(())
}
