//! IAM error types.

use s3gate_core::StoreError;
use s3gate_policy::PolicyError;

/// Errors raised by credential handling and the IAM store.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    /// Access key outside 3-20 characters.
    #[error("access key must be 3-20 characters, got {0}")]
    InvalidAccessKeyLength(usize),

    /// Secret key outside 8-40 characters.
    #[error("secret key must be 8-40 characters, got {0}")]
    InvalidSecretKeyLength(usize),

    /// No user or temporary credential with this access key.
    #[error("no such user: {0}")]
    NoSuchUser(String),

    /// The named policy is not attached to the user.
    #[error("no policy {policy} attached to user {user}")]
    NoSuchUserPolicy {
        /// User access key.
        user: String,
        /// Policy name.
        policy: String,
    },

    /// Policy names must be non-empty and free of the `-` key separator.
    #[error("invalid policy name: {0:?}")]
    InvalidPolicyName(String),

    /// The bucket has no policy.
    #[error("bucket {0} has no policy")]
    NoSuchBucketPolicy(String),

    /// Session token claims are missing or unusable.
    #[error("invalid session claims: {0}")]
    InvalidClaims(String),

    /// Signing or verifying a session token failed.
    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// A stored or submitted policy is invalid.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A stored record could not be (de)serialized.
    #[error("corrupt IAM record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for IAM operations.
pub type IamResult<T> = Result<T, IamError>;
