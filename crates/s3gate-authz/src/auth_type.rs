//! Classifying how a request is authenticated.

use std::fmt;

use s3gate_auth::sigv2::is_sigv2;
use s3gate_auth::sigv4::{STREAMING_PAYLOAD, SUPPORTED_ALGORITHM};

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication scheme of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    /// No credentials at all.
    Anonymous,
    /// `Authorization: AWS <ak>:<sig>`.
    V2Header,
    /// `AWSAccessKeyId`/`Signature`/`Expires` query parameters.
    V2Presigned,
    /// SigV4 header request whose body is `aws-chunked` signed.
    Streaming,
    /// `Authorization: AWS4-HMAC-SHA256 ...`.
    V4Header,
    /// `X-Amz-Credential` and friends in the query.
    V4Presigned,
    /// `Authorization: Bearer <jwt>`.
    Jwt,
    /// Credentials in a shape none of the above accepts.
    Unknown,
}

impl AuthType {
    /// Whether the request carries a SigV4 or SigV2 signature.
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::V2Header | Self::V2Presigned | Self::Streaming | Self::V4Header | Self::V4Presigned
        )
    }

    /// Whether the signature travels in the query string.
    #[must_use]
    pub fn is_presigned(self) -> bool {
        matches!(self, Self::V2Presigned | Self::V4Presigned)
    }

    /// `aws:signatureversion` condition value.
    #[must_use]
    pub fn signature_version(self) -> Option<&'static str> {
        match self {
            Self::V2Header | Self::V2Presigned => Some("AWS2"),
            Self::Streaming | Self::V4Header | Self::V4Presigned => Some(SUPPORTED_ALGORITHM),
            Self::Anonymous | Self::Jwt | Self::Unknown => None,
        }
    }

    /// `aws:AuthType` condition value.
    #[must_use]
    pub fn condition_value(self) -> Option<&'static str> {
        match self {
            Self::V2Header | Self::Streaming | Self::V4Header | Self::Jwt => Some("REST-HEADER"),
            Self::V2Presigned | Self::V4Presigned => Some("REST-QUERY-STRING"),
            Self::Anonymous | Self::Unknown => None,
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anonymous => "anonymous",
            Self::V2Header => "v2-header",
            Self::V2Presigned => "v2-presigned",
            Self::Streaming => "streaming",
            Self::V4Header => "v4-header",
            Self::V4Presigned => "v4-presigned",
            Self::Jwt => "jwt",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Decide the authentication scheme from the header and query shape.
///
/// Checked in order: SigV2 header, SigV2 presigned, streaming, SigV4 header,
/// SigV4 presigned, JWT bearer, anonymous. Anything else is
/// [`AuthType::Unknown`].
#[must_use]
pub fn classify_auth_type(parts: &http::request::Parts) -> AuthType {
    let auth_header = parts.headers.get(http::header::AUTHORIZATION);
    let auth = auth_header.and_then(|v| v.to_str().ok()).unwrap_or_default();
    let query = QueryShape::of(parts);

    if is_sigv2(auth) {
        return AuthType::V2Header;
    }
    if query.has_v2_signature {
        return AuthType::V2Presigned;
    }
    let is_v4_header = auth.starts_with(SUPPORTED_ALGORITHM);
    if is_v4_header && parts.method == http::Method::PUT && is_streaming_payload(parts) {
        return AuthType::Streaming;
    }
    if is_v4_header {
        return AuthType::V4Header;
    }
    if query.has_v4_credential {
        return AuthType::V4Presigned;
    }
    if auth.starts_with(BEARER_PREFIX) {
        return AuthType::Jwt;
    }
    if auth_header.is_none() && !query.has_any_auth_param {
        return AuthType::Anonymous;
    }
    AuthType::Unknown
}

/// Token of a `Bearer` authorization header.
#[must_use]
pub fn bearer_token(parts: &http::request::Parts) -> Option<&str> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn is_streaming_payload(parts: &http::request::Parts) -> bool {
    parts
        .headers
        .get("x-amz-content-sha256")
        .is_some_and(|v| v.as_bytes() == STREAMING_PAYLOAD.as_bytes())
}

#[derive(Debug, Default)]
struct QueryShape {
    has_v2_signature: bool,
    has_v4_credential: bool,
    has_any_auth_param: bool,
}

impl QueryShape {
    fn of(parts: &http::request::Parts) -> Self {
        let Some(query) = parts.uri.query() else {
            return Self::default();
        };
        let mut has_access_key = false;
        let mut has_signature = false;
        let mut shape = Self::default();
        for (key, _) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "AWSAccessKeyId" => has_access_key = true,
                "Signature" => has_signature = true,
                "X-Amz-Credential" => shape.has_v4_credential = true,
                "X-Amz-Algorithm" | "X-Amz-Signature" => {}
                _ => continue,
            }
            shape.has_any_auth_param = true;
        }
        shape.has_v2_signature = has_access_key && has_signature;
        shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(method: &str, uri: &str, headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_should_classify_anonymous() {
        let p = parts("GET", "http://localhost/bucket/key?versionId=1", &[]);
        assert_eq!(classify_auth_type(&p), AuthType::Anonymous);
    }

    #[test]
    fn test_should_classify_header_schemes() {
        let v2 = parts("GET", "http://localhost/b", &[("authorization", "AWS ak:sig")]);
        assert_eq!(classify_auth_type(&v2), AuthType::V2Header);

        let v4 = parts(
            "GET",
            "http://localhost/b",
            &[("authorization", "AWS4-HMAC-SHA256 Credential=ak/20130524/us-east-1/s3/aws4_request")],
        );
        assert_eq!(classify_auth_type(&v4), AuthType::V4Header);

        let jwt = parts("GET", "http://localhost/b", &[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(classify_auth_type(&jwt), AuthType::Jwt);
        assert_eq!(bearer_token(&jwt), Some("abc.def.ghi"));
    }

    #[test]
    fn test_should_classify_streaming_puts_only() {
        let headers = [
            ("authorization", "AWS4-HMAC-SHA256 Credential=x"),
            ("x-amz-content-sha256", STREAMING_PAYLOAD),
        ];
        assert_eq!(
            classify_auth_type(&parts("PUT", "http://localhost/b/k", &headers)),
            AuthType::Streaming
        );
        assert_eq!(
            classify_auth_type(&parts("POST", "http://localhost/b/k", &headers)),
            AuthType::V4Header
        );
    }

    #[test]
    fn test_should_classify_presigned_schemes() {
        let v2 = parts(
            "GET",
            "http://localhost/b/k?AWSAccessKeyId=ak&Expires=1&Signature=s",
            &[],
        );
        assert_eq!(classify_auth_type(&v2), AuthType::V2Presigned);

        let v4 = parts(
            "GET",
            "http://localhost/b/k?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Credential=ak%2F20130524%2Fus-east-1%2Fs3%2Faws4_request",
            &[],
        );
        assert_eq!(classify_auth_type(&v4), AuthType::V4Presigned);
    }

    #[test]
    fn test_should_prefer_v2_header_over_presigned_query() {
        let p = parts(
            "GET",
            "http://localhost/b/k?X-Amz-Credential=x",
            &[("authorization", "AWS ak:sig")],
        );
        assert_eq!(classify_auth_type(&p), AuthType::V2Header);
    }

    #[test]
    fn test_should_classify_unknown_shapes() {
        let other = parts("GET", "http://localhost/b", &[("authorization", "Digest x")]);
        assert_eq!(classify_auth_type(&other), AuthType::Unknown);

        let partial = parts("GET", "http://localhost/b?X-Amz-Signature=abc", &[]);
        assert_eq!(classify_auth_type(&partial), AuthType::Unknown);
    }

    #[test]
    fn test_should_report_condition_values() {
        assert_eq!(AuthType::V2Presigned.signature_version(), Some("AWS2"));
        assert_eq!(AuthType::V4Presigned.condition_value(), Some("REST-QUERY-STRING"));
        assert_eq!(AuthType::Anonymous.signature_version(), None);
        assert!(AuthType::Streaming.is_signed());
        assert!(!AuthType::Jwt.is_signed());
    }
}
