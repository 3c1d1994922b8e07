//! Client-facing error codes.
//!
//! [`ApiErrorCode`] is the stable taxonomy handed back to S3 and STS
//! clients. Internal errors ([`AuthError`], [`IamError`]) map onto it; store
//! failures always become [`ApiErrorCode::InternalError`] so no store detail
//! reaches the wire.

use std::fmt;

use http::StatusCode;
use s3gate_auth::AuthError;
use s3gate_core::ServiceType;
use s3gate_iam::IamError;

use crate::xml::error_to_xml;

macro_rules! api_error_codes {
    ($($(#[$doc:meta])* $variant:ident => ($status:ident, $code:literal, $description:literal),)+) => {
        /// Outcome of authenticating or authorizing a request.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum ApiErrorCode {
            /// Success. Never carried by an error.
            #[default]
            None,
            $($(#[$doc])* $variant,)+
        }

        impl ApiErrorCode {
            /// Error code as it appears in the `<Code>` element.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    Self::None => "",
                    $(Self::$variant => $code,)+
                }
            }

            /// HTTP status of the error response.
            #[must_use]
            pub fn status_code(self) -> StatusCode {
                match self {
                    Self::None => StatusCode::OK,
                    $(Self::$variant => StatusCode::$status,)+
                }
            }

            /// Human-readable description sent as `<Message>`.
            #[must_use]
            pub fn description(self) -> &'static str {
                match self {
                    Self::None => "",
                    $(Self::$variant => $description,)+
                }
            }
        }
    };
}

api_error_codes! {
    /// Policy evaluation denied the request.
    AccessDenied => (FORBIDDEN, "AccessDenied", "Access Denied."),
    /// Another account owns the bucket.
    BucketAlreadyExists => (CONFLICT, "BucketAlreadyExists",
        "The requested bucket name is not available. The bucket namespace is shared by all users of the system. Please select a different name and try again."),
    /// The bucket has no policy.
    NoSuchBucketPolicy => (NOT_FOUND, "NoSuchBucketPolicy", "The bucket policy does not exist"),
    /// The user has no policy of that name.
    NoSuchUserPolicy => (NOT_FOUND, "NoSuchUserPolicy", "The specified user policy does not exist"),
    /// The policy document is invalid.
    MalformedPolicy => (BAD_REQUEST, "MalformedPolicy", "Policy has invalid resource."),
    /// The computed signature differs from the supplied one.
    SignatureDoesNotMatch => (FORBIDDEN, "SignatureDoesNotMatch",
        "The request signature we calculated does not match the signature you provided. Check your key and signing method."),
    /// The auth scheme is not accepted for this request.
    SignatureVersionNotSupported => (BAD_REQUEST, "InvalidRequest",
        "The authorization mechanism you have provided is not supported. Please use AWS4-HMAC-SHA256."),
    /// The `Authorization` header or its scope is malformed.
    AuthorizationHeaderMalformed => (BAD_REQUEST, "AuthorizationHeaderMalformed",
        "The authorization header is malformed; the region is wrong."),
    /// The `Authorization` header carries none of the expected fields.
    MissingFields => (BAD_REQUEST, "MissingFields", "Missing fields in request."),
    /// No `Credential=` field.
    MissingCredTag => (BAD_REQUEST, "InvalidRequest", "Missing Credential field for this request."),
    /// No `SignedHeaders=` field.
    MissingSignHeadersTag => (BAD_REQUEST, "InvalidArgument", "Signature header missing SignedHeaders field."),
    /// No `Signature=` field.
    MissingSignTag => (BAD_REQUEST, "AccessDenied", "Signature header missing Signature field."),
    /// The credential is not `AKID/date/region/service/aws4_request`.
    CredMalformed => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "Error parsing the X-Amz-Credential parameter; the Credential is mal-formed; expecting \"<YOUR-AKID>/YYYYMMDD/REGION/SERVICE/aws4_request\"."),
    /// The credential date is not `YYYYMMDD`.
    MalformedCredentialDate => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "Error parsing the X-Amz-Credential parameter; incorrect date format. This date in the credential must be in the format \"yyyyMMdd\"."),
    /// The date header cannot be parsed.
    MalformedDate => (BAD_REQUEST, "MalformedDate",
        "Invalid date format header, expected to be in ISO8601, RFC1123 or RFC1123Z time format."),
    /// `X-Amz-Date` cannot be parsed.
    MalformedPresignedDate => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "X-Amz-Date must be in the ISO8601 Long Format \"yyyyMMdd'T'HHmmss'Z'\""),
    /// The expiry is not an integer.
    MalformedExpires => (BAD_REQUEST, "AuthorizationQueryParametersError", "X-Amz-Expires should be a number"),
    /// Neither `x-amz-date` nor `Date` is present.
    MissingDateHeader => (BAD_REQUEST, "AccessDenied", "AWS authentication requires a valid Date or x-amz-date header"),
    /// `host` is not signed, or a signed header is absent.
    UnsignedHeaders => (BAD_REQUEST, "AccessDenied", "There were headers present in the request which were not signed"),
    /// A presigned URL lacks a required query parameter.
    InvalidQueryParams => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "Query-string authentication version 4 requires the X-Amz-Algorithm, X-Amz-Credential, X-Amz-Signature, X-Amz-Date, X-Amz-SignedHeaders, and X-Amz-Expires parameters."),
    /// `X-Amz-Algorithm` is not `AWS4-HMAC-SHA256`.
    InvalidQuerySignatureAlgo => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "X-Amz-Algorithm only supports \"AWS4-HMAC-SHA256\"."),
    /// The presigned URL has expired.
    ExpiredPresignRequest => (FORBIDDEN, "AccessDenied", "Request has expired"),
    /// The presigned URL is dated in the future.
    RequestNotReadyYet => (FORBIDDEN, "AccessDenied", "Request is not valid yet"),
    /// The signing time is too far from the server clock.
    RequestTimeTooSkewed => (FORBIDDEN, "RequestTimeTooSkewed",
        "The difference between the request time and the server's time is too large."),
    /// `X-Amz-Expires` is negative.
    NegativeExpires => (BAD_REQUEST, "AuthorizationQueryParametersError", "X-Amz-Expires must be non-negative"),
    /// `X-Amz-Expires` exceeds one week.
    MaximumExpires => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "X-Amz-Expires must be less than a week (in seconds) that is 604800"),
    /// The access key is unknown.
    InvalidAccessKeyId => (FORBIDDEN, "InvalidAccessKeyId", "The Access Key Id you provided does not exist in our records."),
    /// The access key is disabled or expired.
    AccessKeyDisabled => (FORBIDDEN, "InvalidAccessKeyId", "Your account is disabled; please contact your administrator."),
    /// The session or bearer token is missing, wrong or expired.
    InvalidToken => (FORBIDDEN, "InvalidTokenId", "The security token included in the request is invalid"),
    /// The credential scope names another service than `s3`.
    InvalidServiceS3 => (BAD_REQUEST, "AuthorizationParametersError",
        "Error parsing the Credential/X-Amz-Credential parameter; incorrect service. This endpoint belongs to \"s3\"."),
    /// The credential scope names another service than `sts`.
    InvalidServiceSts => (BAD_REQUEST, "AuthorizationParametersError",
        "Error parsing the Credential parameter; incorrect service. This endpoint belongs to \"sts\"."),
    /// The credential scope does not end with `aws4_request`.
    InvalidRequestVersion => (BAD_REQUEST, "AuthorizationQueryParametersError",
        "Error parsing the X-Amz-Credential parameter; incorrect terminal. This endpoint uses \"aws4_request\"."),
    /// `DurationSeconds` is outside 900..=43200.
    InvalidDuration => (BAD_REQUEST, "InvalidParameterValue", "Duration provided in the request is invalid."),
    /// An STS parameter is missing or invalid.
    InvalidParameterValue => (BAD_REQUEST, "InvalidParameterValue",
        "An invalid or out-of-range value was supplied for the input parameter."),
    /// Store or other internal failure.
    InternalError => (INTERNAL_SERVER_ERROR, "InternalError", "We encountered an internal error, please try again."),
}

impl ApiErrorCode {
    /// Whether this is the success sentinel.
    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&AuthError> for ApiErrorCode {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidRegion { .. } => Self::AuthorizationHeaderMalformed,
            AuthError::MissingFields => Self::MissingFields,
            AuthError::MissingCredTag => Self::MissingCredTag,
            AuthError::MissingSignHeadersTag => Self::MissingSignHeadersTag,
            AuthError::MissingSignTag => Self::MissingSignTag,
            AuthError::UnsupportedAlgorithm(_) => Self::SignatureVersionNotSupported,
            AuthError::InvalidQuerySignatureAlgo(_) => Self::InvalidQuerySignatureAlgo,
            AuthError::MissingHeader(_) | AuthError::UnsignedHeaders => Self::UnsignedHeaders,
            AuthError::InvalidCredential => Self::CredMalformed,
            AuthError::MalformedCredentialDate(_) => Self::MalformedCredentialDate,
            AuthError::InvalidService { expected, .. } => match expected {
                ServiceType::S3 => Self::InvalidServiceS3,
                ServiceType::Sts => Self::InvalidServiceSts,
            },
            AuthError::InvalidTerminal(_) => Self::InvalidRequestVersion,
            AuthError::MissingDateHeader => Self::MissingDateHeader,
            AuthError::MalformedDate => Self::MalformedDate,
            AuthError::MalformedPresignedDate => Self::MalformedPresignedDate,
            AuthError::MalformedExpires => Self::MalformedExpires,
            AuthError::NegativeExpires => Self::NegativeExpires,
            AuthError::MaximumExpires => Self::MaximumExpires,
            AuthError::RequestNotReadyYet => Self::RequestNotReadyYet,
            AuthError::RequestExpired => Self::ExpiredPresignRequest,
            AuthError::RequestTimeTooSkewed => Self::RequestTimeTooSkewed,
            AuthError::MissingQueryParam(_) => Self::InvalidQueryParams,
            AuthError::AccessKeyNotFound(_) => Self::InvalidAccessKeyId,
            AuthError::AccessKeyDisabled(_) => Self::AccessKeyDisabled,
            AuthError::SignatureDoesNotMatch => Self::SignatureDoesNotMatch,
            AuthError::Internal(_) => Self::InternalError,
        }
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(err: AuthError) -> Self {
        Self::from(&err)
    }
}

impl From<&IamError> for ApiErrorCode {
    fn from(err: &IamError) -> Self {
        match err {
            IamError::NoSuchUser(_) => Self::InvalidAccessKeyId,
            IamError::NoSuchUserPolicy { .. } => Self::NoSuchUserPolicy,
            IamError::NoSuchBucketPolicy(_) => Self::NoSuchBucketPolicy,
            IamError::InvalidClaims(_) | IamError::Token(_) => Self::InvalidToken,
            IamError::Policy(_) => Self::MalformedPolicy,
            IamError::InvalidAccessKeyLength(_)
            | IamError::InvalidSecretKeyLength(_)
            | IamError::InvalidPolicyName(_) => {
                Self::InvalidParameterValue
            }
            IamError::Serialization(_) | IamError::Store(_) => Self::InternalError,
        }
    }
}

impl From<IamError> for ApiErrorCode {
    fn from(err: IamError) -> Self {
        Self::from(&err)
    }
}

/// An error response: a code plus the message sent with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The error code.
    pub code: ApiErrorCode,
    /// Message sent as `<Message>`; defaults to the code's description.
    pub message: String,
}

impl ApiError {
    /// Error with the code's default description.
    #[must_use]
    pub fn new(code: ApiErrorCode) -> Self {
        Self {
            code,
            message: code.description().to_owned(),
        }
    }

    /// Error with a custom message.
    #[must_use]
    pub fn with_message(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Render the flat `<Error>` body.
    #[must_use]
    pub fn to_xml(&self, resource: &str, request_id: &str) -> Vec<u8> {
        let resource = (!resource.is_empty()).then_some(resource);
        error_to_xml(self.code.as_str(), &self.message, resource, request_id)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ApiErrorCode> for ApiError {
    fn from(code: ApiErrorCode) -> Self {
        Self::new(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_wire_code_status_and_description() {
        let code = ApiErrorCode::SignatureDoesNotMatch;
        assert_eq!(code.as_str(), "SignatureDoesNotMatch");
        assert_eq!(code.status_code(), StatusCode::FORBIDDEN);
        assert!(code.description().starts_with("The request signature"));

        assert_eq!(ApiErrorCode::BucketAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiErrorCode::NoSuchBucketPolicy.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(ApiErrorCode::default().is_none());
    }

    #[test]
    fn test_should_map_auth_errors() {
        assert_eq!(
            ApiErrorCode::from(&AuthError::RequestExpired),
            ApiErrorCode::ExpiredPresignRequest
        );
        assert_eq!(
            ApiErrorCode::from(&AuthError::InvalidService {
                expected: ServiceType::Sts,
                found: "s3".to_owned(),
            }),
            ApiErrorCode::InvalidServiceSts
        );
        assert_eq!(
            ApiErrorCode::from(&AuthError::Internal("disk".to_owned())),
            ApiErrorCode::InternalError
        );
        assert_eq!(
            ApiErrorCode::from(&AuthError::AccessKeyNotFound("x".to_owned())),
            ApiErrorCode::InvalidAccessKeyId
        );
    }

    #[test]
    fn test_should_hide_store_failures() {
        let err = IamError::Store(s3gate_core::StoreError::NotFound("user/x".to_owned()));
        assert_eq!(ApiErrorCode::from(&err), ApiErrorCode::InternalError);
        assert_eq!(
            ApiErrorCode::from(&IamError::NoSuchBucketPolicy("b".to_owned())),
            ApiErrorCode::NoSuchBucketPolicy
        );
    }

    #[test]
    fn test_should_render_error_xml() {
        let xml = ApiError::new(ApiErrorCode::AccessDenied).to_xml("/bucket/key", "req-1");
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains("<Code>AccessDenied</Code>"));
        assert!(xml.contains("<Message>Access Denied.</Message>"));
        assert!(xml.contains("<Resource>/bucket/key</Resource>"));
        assert!(xml.contains("<RequestId>req-1</RequestId>"));

        let xml = ApiError::with_message(ApiErrorCode::AccessDenied, "nope").to_xml("", "req-2");
        let xml = String::from_utf8(xml).unwrap();
        assert!(!xml.contains("<Resource>"));
        assert!(xml.contains("<Message>nope</Message>"));
    }
}
