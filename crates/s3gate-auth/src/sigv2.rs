//! AWS Signature Version 2 verification.
//!
//! SigV2 signs with HMAC-SHA1. Header requests carry
//! `Authorization: AWS <AWSAccessKeyId>:<Signature>`; presigned requests carry
//! `AWSAccessKeyId`, `Signature` and `Expires` (epoch seconds) in the query.
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date-or-Expires + "\n" +
//!                CanonicalizedAmzHeaders +
//!                CanonicalizedResource
//! ```

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use tracing::debug;

use crate::canonical::parse_query;
use crate::context::VerifyContext;
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::sigv4::{AuthResult, signatures_match};

type HmacSha1 = Hmac<Sha1>;

/// Sub-resources that take part in the canonicalized resource.
const SUB_RESOURCES: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// Check whether the `Authorization` header uses SigV2 format (`AWS AKID:sig`).
#[must_use]
pub fn is_sigv2(auth_header: &str) -> bool {
    auth_header.starts_with("AWS ") && !auth_header.starts_with("AWS4-")
}

/// Verify an AWS SigV2 `Authorization` header request.
///
/// # Errors
///
/// Returns an [`AuthError`] if the header is malformed, the access key is not
/// found, or the signature does not match.
pub fn verify_sigv2(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
) -> Result<AuthResult, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (access_key_id, provided_signature) = parse_sigv2_header(auth_header)?;

    debug!(access_key_id = %access_key_id, "Verifying SigV2 signature");

    let secret_key = credential_provider.get_secret_key(&access_key_id)?;

    // With x-amz-date present the Date field is left empty.
    let date = if parts.headers.contains_key("x-amz-date") {
        String::new()
    } else {
        header_value(parts, "date")
    };
    let string_to_sign = build_string_to_sign_v2(parts, &date);

    debug!(string_to_sign = ?string_to_sign, "Built SigV2 string to sign");

    let expected_signature = compute_sigv2_signature(&secret_key, &string_to_sign);
    signatures_match(&expected_signature, &provided_signature)?;

    debug!(access_key_id = %access_key_id, "SigV2 verification succeeded");
    Ok(v2_result(access_key_id))
}

/// Verify an AWS SigV2 presigned request.
///
/// # Errors
///
/// Returns [`AuthError::MissingQueryParam`] if `AWSAccessKeyId`, `Signature`
/// or `Expires` is absent, [`AuthError::MalformedExpires`] if `Expires` is not
/// an integer, [`AuthError::RequestExpired`] once `Expires` has passed, and
/// [`AuthError::SignatureDoesNotMatch`] for a wrong signature.
pub fn verify_presigned_v2(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
    ctx: &VerifyContext,
) -> Result<AuthResult, AuthError> {
    let params: BTreeMap<String, String> = parse_query(parts.uri.query().unwrap_or(""))
        .into_iter()
        .collect();
    let required = |name: &str| {
        params
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::MissingQueryParam(name.to_owned()))
    };

    let access_key_id = required("AWSAccessKeyId")?;
    let provided_signature = required("Signature")?;
    let expires = required("Expires")?;

    debug!(access_key_id = %access_key_id, expires = %expires, "Verifying SigV2 presigned URL");

    let secret_key = credential_provider.get_secret_key(&access_key_id)?;

    let expires_at: i64 = expires.parse().map_err(|_| AuthError::MalformedExpires)?;
    if expires_at < ctx.now.timestamp() {
        return Err(AuthError::RequestExpired);
    }

    let string_to_sign = build_string_to_sign_v2(parts, &expires);
    let expected_signature = compute_sigv2_signature(&secret_key, &string_to_sign);
    signatures_match(&expected_signature, &provided_signature)?;

    Ok(v2_result(access_key_id))
}

/// Build the SigV2 string to sign with `date` in the date slot.
///
/// Header requests pass the `Date` header (or empty when `x-amz-date` is
/// set); presigned requests pass the `Expires` value.
#[must_use]
pub fn build_string_to_sign_v2(parts: &http::request::Parts, date: &str) -> String {
    let method = parts.method.as_str();
    let content_md5 = header_value(parts, "content-md5");
    let content_type = header_value(parts, "content-type");
    let amz_headers = build_canonicalized_amz_headers(parts);
    let resource = build_canonicalized_resource(parts);

    format!("{method}\n{content_md5}\n{content_type}\n{date}\n{amz_headers}{resource}")
}

/// Base64(HMAC-SHA1(secret, string_to_sign)).
#[must_use]
pub fn compute_sigv2_signature(secret_key: &str, string_to_sign: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC can accept any key length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn v2_result(access_key_id: String) -> AuthResult {
    AuthResult {
        access_key_id,
        region: String::new(),
        service: "s3".to_owned(),
        signed_headers: Vec::new(),
    }
}

/// Parse a SigV2 `Authorization` header: `AWS AKID:Signature`.
fn parse_sigv2_header(header: &str) -> Result<(String, String), AuthError> {
    let rest = header
        .strip_prefix("AWS ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let (access_key_id, signature) = rest.split_once(':').ok_or(AuthError::InvalidAuthHeader)?;

    if access_key_id.is_empty() || signature.is_empty() {
        return Err(AuthError::MissingFields);
    }

    Ok((access_key_id.to_owned(), signature.to_owned()))
}

/// Lowercased, sorted `x-amz-*` headers as `name:v1,v2\n` lines.
fn build_canonicalized_amz_headers(parts: &http::request::Parts) -> String {
    let mut amz_headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, value) in &parts.headers {
        let name_str = name.as_str();
        if name_str.starts_with("x-amz-") {
            amz_headers
                .entry(name_str)
                .or_default()
                .push(value.to_str().unwrap_or("").trim());
        }
    }

    amz_headers
        .iter()
        .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
        .collect()
}

/// The URI path plus whitelisted sub-resource parameters, sorted by key.
fn build_canonicalized_resource(parts: &http::request::Parts) -> String {
    let path = parts.uri.path();
    let mut sub_params: Vec<(String, String)> = parse_query(parts.uri.query().unwrap_or(""))
        .into_iter()
        .filter(|(k, _)| SUB_RESOURCES.contains(&k.as_str()))
        .collect();

    if sub_params.is_empty() {
        return path.to_owned();
    }

    sub_params.sort_by(|a, b| a.0.cmp(&b.0));
    let params_str: Vec<String> = sub_params
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{k}={v}")
            }
        })
        .collect();
    format!("{path}?{}", params_str.join("&"))
}

fn header_value(parts: &http::request::Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}
