//! Chunk signatures for `STREAMING-AWS4-HMAC-SHA256-PAYLOAD` uploads.
//!
//! The seed request is verified like any header-signed request with the
//! streaming sentinel as payload hash. Each following chunk is signed over
//! the previous signature:
//!
//! ```text
//! AWS4-HMAC-SHA256-PAYLOAD\n
//! <timestamp>\n
//! <credential scope>\n
//! <previous signature>\n
//! <hex(SHA256(""))>\n
//! <hex(SHA256(chunk))>
//! ```

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::context::VerifyContext;
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::sigv4::{
    AuthResult, EMPTY_SHA256, STREAMING_PAYLOAD, compute_signature, signatures_match,
    verify_sigv4_detailed,
};

const CHUNK_ALGORITHM: &str = "AWS4-HMAC-SHA256-PAYLOAD";

/// Signing state carried across the chunks of a streaming upload.
#[derive(Clone)]
pub struct StreamingContext {
    auth: AuthResult,
    signing_key: Vec<u8>,
    timestamp: String,
    credential_scope: String,
    previous_signature: String,
}

impl fmt::Debug for StreamingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingContext")
            .field("access_key_id", &self.auth.access_key_id)
            .field("timestamp", &self.timestamp)
            .field("credential_scope", &self.credential_scope)
            .field("previous_signature", &self.previous_signature)
            .finish_non_exhaustive()
    }
}

impl StreamingContext {
    /// The verified identity of the seed request.
    #[must_use]
    pub fn auth(&self) -> &AuthResult {
        &self.auth
    }

    /// Signature the next chunk must chain from.
    #[must_use]
    pub fn previous_signature(&self) -> &str {
        &self.previous_signature
    }

    /// Expected signature of `chunk` chained from `previous_signature`.
    #[must_use]
    pub fn chunk_signature(&self, previous_signature: &str, chunk: &[u8]) -> String {
        let chunk_hash = hex::encode(Sha256::digest(chunk));
        let string_to_sign = format!(
            "{CHUNK_ALGORITHM}\n{}\n{}\n{previous_signature}\n{EMPTY_SHA256}\n{chunk_hash}",
            self.timestamp, self.credential_scope
        );
        compute_signature(&self.signing_key, &string_to_sign)
    }

    /// Check the next chunk and advance the chain.
    ///
    /// The final zero-length chunk is verified the same way.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignatureDoesNotMatch`] if `provided` is wrong;
    /// the chain does not advance in that case.
    pub fn verify_chunk(&mut self, chunk: &[u8], provided: &str) -> Result<(), AuthError> {
        let expected = self.chunk_signature(&self.previous_signature, chunk);
        signatures_match(&expected, provided)?;
        debug!(len = chunk.len(), "Chunk signature verified");
        self.previous_signature = expected;
        Ok(())
    }
}

/// Verify the seed request of a streaming upload.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] unless `x-amz-content-sha256`
/// carries the streaming sentinel, otherwise any error of
/// [`verify_sigv4`](crate::sigv4::verify_sigv4).
pub fn verify_streaming(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
    ctx: &VerifyContext,
) -> Result<StreamingContext, AuthError> {
    let sentinel = parts
        .headers
        .get("x-amz-content-sha256")
        .and_then(|v| v.to_str().ok());
    if sentinel != Some(STREAMING_PAYLOAD) {
        return Err(AuthError::InvalidAuthHeader);
    }

    let verified = verify_sigv4_detailed(parts, None, credential_provider, ctx)?;
    Ok(StreamingContext {
        auth: verified.result,
        signing_key: verified.signing_key,
        timestamp: verified.timestamp,
        credential_scope: verified.credential_scope,
        previous_signature: verified.signature,
    })
}
