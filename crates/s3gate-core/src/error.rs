//! Error types for the s3gate core.

/// Core error type for s3gate infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Unknown service name in a credential scope or call site.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for s3gate core operations.
pub type GateResult<T> = Result<T, GateError>;
