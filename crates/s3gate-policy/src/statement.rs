use serde::{Deserialize, Serialize};

use crate::action::ActionSet;
use crate::args::Args;
use crate::condition::Conditions;
use crate::effect::Effect;
use crate::error::PolicyError;
use crate::principal::Principal;
use crate::resource::ResourceSet;

/// One Allow or Deny rule of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statement {
    /// Optional statement id.
    #[serde(rename = "Sid", default, skip_serializing_if = "String::is_empty")]
    pub sid: String,

    /// Allow or Deny.
    #[serde(rename = "Effect")]
    pub effect: Effect,

    /// Who the statement applies to. IAM user policies omit it.
    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    /// Covered actions.
    #[serde(rename = "Action")]
    pub actions: ActionSet,

    /// Covered resources. Empty means every resource.
    #[serde(rename = "Resource", default, skip_serializing_if = "ResourceSet::is_empty")]
    pub resources: ResourceSet,

    /// Extra predicates over the request context.
    #[serde(rename = "Condition", default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
}

impl Statement {
    /// Whether principal, action, resource and conditions all match `args`.
    #[must_use]
    pub fn is_match(&self, args: &Args<'_>) -> bool {
        'c: {
            if let Some(principal) = &self.principal {
                if !principal.is_match(args.account) {
                    break 'c false;
                }
            }

            if !self.actions.is_match(args.action) {
                break 'c false;
            }

            if !self.resources.is_empty()
                && !self
                    .resources
                    .is_match(&args.resource_path(), args.conditions)
            {
                break 'c false;
            }

            self.conditions.evaluate(args.conditions)
        }
    }

    /// The statement's verdict for `args`: for `Allow`, whether it matches;
    /// for `Deny`, whether it does not.
    #[must_use]
    pub fn is_allowed(&self, args: &Args<'_>) -> bool {
        self.effect.is_allowed(self.is_match(args))
    }

    /// Checks shared by bucket and IAM policies.
    pub fn is_valid(&self) -> Result<(), PolicyError> {
        if self.actions.is_empty() {
            return Err(PolicyError::MissingAction {
                sid: self.sid.clone(),
            });
        }
        Ok(())
    }

    /// Checks for a statement of the bucket policy attached to `bucket`.
    pub fn validate_for_bucket(&self, bucket: &str) -> Result<(), PolicyError> {
        self.is_valid()?;
        if self.principal.as_ref().is_none_or(Principal::is_empty) {
            return Err(PolicyError::MissingPrincipal {
                sid: self.sid.clone(),
            });
        }
        if self.resources.is_empty() {
            return Err(PolicyError::MissingResource {
                sid: self.sid.clone(),
            });
        }
        self.resources.validate_bucket(bucket)
    }
}
