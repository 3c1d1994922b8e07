//! Identity and access management for s3gate.
//!
//! Holds long-lived and temporary [`Credential`]s, the user and bucket
//! policies attached to them, and bucket ownership records. Everything is
//! persisted through [`s3gate_core::KvStore`] by [`IamStore`], which also
//! serves as the [`s3gate_auth::CredentialProvider`] for signature checks.

mod credential;
mod error;
mod store;
mod token;

pub use credential::{
    ACCESS_KEY_MAX_LEN, ACCESS_KEY_MIN_LEN, AccountStatus, Credential, SECRET_KEY_MAX_LEN,
    SECRET_KEY_MIN_LEN, generate_credentials,
};
pub use error::{IamError, IamResult};
pub use store::{BucketMetadata, IamStore, UserIdentity};
pub use token::{ACCESS_KEY_CLAIM, PARENT_CLAIM, SessionClaims, extract_claims, generate_jwt};
