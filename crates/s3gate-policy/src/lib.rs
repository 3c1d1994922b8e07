//! IAM-style policies for s3gate.
//!
//! Bucket policies and IAM user policies share one JSON schema:
//!
//! ```json
//! {
//!     "Version": "2012-10-17",
//!     "Statement": [{
//!         "Sid": "ReadOwnPrefix",
//!         "Effect": "Allow",
//!         "Principal": {"AWS": ["*"]},
//!         "Action": ["s3:GetObject"],
//!         "Resource": ["arn:aws:s3:::mybucket/${aws:username}/*"],
//!         "Condition": {"StringEquals": {"aws:username": "alice"}}
//!     }]
//! }
//! ```
//!
//! [`Policy::is_allowed`] applies explicit deny first, then the owner
//! bypass, then any matching allow; everything else is denied.

mod action;
mod args;
mod condition;
mod context;
mod effect;
mod error;
mod policy;
mod principal;
mod resource;
mod statement;
mod utils;
mod variables;

pub use action::{ALL_ACTIONS, Action, ActionSet, S3Action};
pub use args::Args;
pub use condition::{
    BinaryCondition, ConditionFunction, Conditions, NullCondition, StringCondition,
};
pub use context::{PrincipalType, RequestIdentity, build_condition_values};
pub use effect::Effect;
pub use error::{PolicyError, PolicyResult};
pub use policy::{DEFAULT_VERSION, LEGACY_VERSION, Policy, PolicyDecision};
pub use principal::Principal;
pub use resource::{Resource, ResourceSet, S3_PREFIX};
pub use statement::Statement;
pub use utils::{clean_path, wildcard_match, wildcard_match_simple};
pub use variables::{context_key_name, substitute_variables};
