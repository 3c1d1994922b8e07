//! Request authorization for s3gate.
//!
//! [`Authorizer`] gates every S3 and STS operation: it classifies how a
//! request is authenticated, verifies its signature, resolves the calling
//! identity from the [`s3gate_iam::IamStore`] and evaluates bucket and IAM
//! policies. Failures are reported as stable [`ApiErrorCode`]s that render
//! to the XML error bodies clients expect.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use s3gate_authz::{ApiErrorCode, AuthorizeRequest, Authorizer};
//! use s3gate_core::{GateConfig, MemoryStore};
//! use s3gate_policy::S3Action;
//!
//! let authz = Authorizer::from_config(Arc::new(MemoryStore::new()), GateConfig::default()).unwrap();
//! let (parts, ()) = http::Request::get("http://localhost/bucket/key")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//!
//! let outcome = authz.authorize(&AuthorizeRequest::new(&parts, S3Action::GetObject, "bucket", "key"));
//! assert_eq!(outcome.code, ApiErrorCode::AccessDenied);
//! ```

mod auth_type;
mod authorizer;
mod error;
mod sts;
mod xml;

pub use auth_type::{AuthType, bearer_token, classify_auth_type};
pub use authorizer::{
    Authorization, AuthorizeRequest, Authorizer, SECURITY_TOKEN_HEADER, SECURITY_TOKEN_QUERY,
};
pub use error::{ApiError, ApiErrorCode};
pub use sts::{
    AssumeRoleOutput, MAX_DURATION_SECS, MAX_SESSION_POLICY_LEN, MIN_DURATION_SECS,
    STS_API_VERSION,
};
pub use xml::{STS_NAMESPACE, XmlError, error_to_xml, sts_error_to_xml, sts_response_to_xml};
