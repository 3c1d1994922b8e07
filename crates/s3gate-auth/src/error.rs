//! Error types for request signature verification.
//!
//! All verification failures are represented by [`AuthError`]. Variants are
//! fine-grained so callers can map them onto stable client-facing codes, but
//! every cause of a wrong signature folds into [`AuthError::SignatureDoesNotMatch`].

use s3gate_core::ServiceType;

/// Errors that can occur while verifying a signed request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The `Authorization` header carries none of the expected fields.
    #[error("Missing fields in Authorization header")]
    MissingFields,

    /// No `Credential=` field in the `Authorization` header.
    #[error("Missing Credential field")]
    MissingCredTag,

    /// No `SignedHeaders=` field in the `Authorization` header.
    #[error("Missing SignedHeaders field")]
    MissingSignHeadersTag,

    /// No `Signature=` field in the `Authorization` header.
    #[error("Missing Signature field")]
    MissingSignTag,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `X-Amz-Algorithm` query parameter is not AWS4-HMAC-SHA256.
    #[error("Unsupported query signature algorithm: {0}")]
    InvalidQuerySignatureAlgo(String),

    /// A required HTTP header referenced in `SignedHeaders` is missing.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `host` header is not part of the signed headers.
    #[error("Host header is not signed")]
    UnsignedHeaders,

    /// The credential does not match `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The date in the credential scope is not `YYYYMMDD`.
    #[error("Invalid credential date: {0}")]
    MalformedCredentialDate(String),

    /// The credential scope names a different service than the endpoint.
    #[error("Credential scope service {found} does not match {expected}")]
    InvalidService {
        /// Service the endpoint belongs to.
        expected: ServiceType,
        /// Service named in the credential scope.
        found: String,
    },

    /// The credential scope names a different region than the gateway.
    #[error("Credential scope region {found} does not match {expected}")]
    InvalidRegion {
        /// Region the gateway is configured for.
        expected: String,
        /// Region named in the credential scope.
        found: String,
    },

    /// The credential scope does not end with `aws4_request`.
    #[error("Invalid credential scope terminal: {0}")]
    InvalidTerminal(String),

    /// Neither `x-amz-date` nor `Date` is present.
    #[error("Missing date header")]
    MissingDateHeader,

    /// The request date header could not be parsed.
    #[error("Malformed date header")]
    MalformedDate,

    /// `X-Amz-Date` is not in ISO 8601 basic format.
    #[error("Malformed X-Amz-Date")]
    MalformedPresignedDate,

    /// The expiry parameter is not an integer.
    #[error("Malformed expires value")]
    MalformedExpires,

    /// `X-Amz-Expires` is negative.
    #[error("X-Amz-Expires must be non-negative")]
    NegativeExpires,

    /// `X-Amz-Expires` exceeds one week.
    #[error("X-Amz-Expires must be less than a week")]
    MaximumExpires,

    /// The presigned request is signed too far in the future.
    #[error("Request is not valid yet")]
    RequestNotReadyYet,

    /// The presigned URL has expired.
    #[error("Request has expired")]
    RequestExpired,

    /// The signing time is too far from the server clock.
    #[error("Request time too skewed")]
    RequestTimeTooSkewed,

    /// A required query parameter for presigned URL authentication is missing.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The access key exists but is disabled or expired.
    #[error("Access key disabled: {0}")]
    AccessKeyDisabled(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The credential lookup failed for reasons other than a missing key.
    #[error("credential lookup failed: {0}")]
    Internal(String),
}
