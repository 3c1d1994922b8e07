//! Policy error types.

/// Errors raised while parsing or validating a policy document.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The document is not valid policy JSON.
    #[error("malformed policy document: {0}")]
    Json(#[from] serde_json::Error),

    /// `Version` is neither `2012-10-17` nor `2008-10-17`.
    #[error("invalid policy version: {0:?}")]
    InvalidVersion(String),

    /// A statement has no actions.
    #[error("statement {sid:?} has no actions")]
    MissingAction {
        /// Statement id.
        sid: String,
    },

    /// A bucket-policy statement has no principal.
    #[error("statement {sid:?} has no principal")]
    MissingPrincipal {
        /// Statement id.
        sid: String,
    },

    /// A bucket-policy statement has no resources.
    #[error("statement {sid:?} has no resources")]
    MissingResource {
        /// Statement id.
        sid: String,
    },

    /// Unknown or malformed action.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Unknown operator, unsupported qualifier, bad key or bad value in a
    /// `Condition` block.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// Resource is not an `arn:aws:s3:::` ARN or has an empty bucket.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// Resource of a bucket policy names another bucket.
    #[error("resource {resource} does not belong to bucket {bucket}")]
    ResourceOutsideBucket {
        /// Bucket the policy is attached to.
        bucket: String,
        /// Offending resource.
        resource: String,
    },
}

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
