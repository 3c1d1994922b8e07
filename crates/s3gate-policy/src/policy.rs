//! Policy documents and their evaluation.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::args::Args;
use crate::effect::Effect;
use crate::error::{PolicyError, PolicyResult};
use crate::statement::Statement;

/// Current policy language version.
pub const DEFAULT_VERSION: &str = "2012-10-17";

/// Legacy policy language version, still accepted.
pub const LEGACY_VERSION: &str = "2008-10-17";

/// Outcome of evaluating a request against its policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The request may proceed.
    Allowed,
    /// The request must be refused with `AccessDenied`.
    Denied,
}

impl PolicyDecision {
    /// Whether the decision permits the request.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

impl From<bool> for PolicyDecision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }
}

/// A bucket policy or IAM user policy document.
///
/// Parse with [`Policy::parse`], which also runs [`Policy::is_valid`].
///
/// ```
/// use std::collections::HashMap;
/// use s3gate_policy::{Args, Policy, S3Action};
///
/// let policy = Policy::parse(br#"{
///     "Version": "2012-10-17",
///     "Statement": [{
///         "Effect": "Allow",
///         "Principal": {"AWS": ["*"]},
///         "Action": ["s3:GetObject"],
///         "Resource": ["arn:aws:s3:::mybucket/*"]
///     }]
/// }"#).unwrap();
///
/// let ctx = HashMap::new();
/// let args = Args {
///     account: "",
///     action: S3Action::GetObject,
///     bucket: "mybucket",
///     object: "x.txt",
///     is_owner: false,
///     conditions: &ctx,
/// };
/// assert!(policy.is_allowed(&args));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Optional policy id.
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Policy language version.
    #[serde(rename = "Version")]
    pub version: String,

    /// The rules.
    #[serde(rename = "Statement", deserialize_with = "deserialize_statements")]
    pub statements: Vec<Statement>,
}

impl Policy {
    /// Parse and validate a policy document.
    pub fn parse(json: &[u8]) -> PolicyResult<Self> {
        let policy: Self = serde_json::from_slice(json)?;
        policy.is_valid()?;
        Ok(policy)
    }

    /// Parse a bucket policy and check it against the bucket it is put on.
    pub fn parse_bucket_policy(json: &[u8], bucket: &str) -> PolicyResult<Self> {
        let policy: Self = serde_json::from_slice(json)?;
        policy.validate_for_bucket(bucket)?;
        Ok(policy)
    }

    /// Checks shared by bucket and IAM policies.
    pub fn is_valid(&self) -> PolicyResult<()> {
        if self.version != DEFAULT_VERSION && self.version != LEGACY_VERSION {
            return Err(PolicyError::InvalidVersion(self.version.clone()));
        }
        self.statements.iter().try_for_each(Statement::is_valid)
    }

    /// Checks for a policy attached to `bucket`: every statement needs a
    /// principal and resources, and every resource must name the bucket.
    pub fn validate_for_bucket(&self, bucket: &str) -> PolicyResult<()> {
        self.is_valid()?;
        self.statements
            .iter()
            .try_for_each(|st| st.validate_for_bucket(bucket))
    }

    /// Deny statements win, owners pass, then any Allow statement grants.
    #[must_use]
    pub fn is_allowed(&self, args: &Args<'_>) -> bool {
        for statement in self.statements.iter().filter(|s| s.effect == Effect::Deny) {
            if !statement.is_allowed(args) {
                debug!(
                    sid = %statement.sid,
                    action = %args.action,
                    account = args.account,
                    "request matched deny statement"
                );
                return false;
            }
        }

        if args.is_owner {
            return true;
        }

        self.statements
            .iter()
            .filter(|s| s.effect == Effect::Allow)
            .any(|s| s.is_allowed(args))
    }

    /// [`Policy::is_allowed`] as a [`PolicyDecision`].
    #[must_use]
    pub fn decide(&self, args: &Args<'_>) -> PolicyDecision {
        self.is_allowed(args).into()
    }

    /// Whether the policy has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.version == other.version
            && self.statements.len() == other.statements.len()
            && self.statements.iter().all(|st| {
                let count = |list: &[Statement]| list.iter().filter(|s| *s == st).count();
                count(&self.statements) == count(&other.statements)
            })
    }
}

impl Eq for Policy {}

impl FromStr for Policy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrManyStatements {
    One(Box<Statement>),
    Many(Vec<Statement>),
}

fn deserialize_statements<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrManyStatements::deserialize(deserializer)? {
        OneOrManyStatements::One(st) => vec![*st],
        OneOrManyStatements::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::S3Action;

    const PUBLIC_READ: &str = r#"{
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicRead",
            "Effect": "Allow",
            "Principal": {"AWS": ["*"]},
            "Action": ["s3:GetObject"],
            "Resource": ["arn:aws:s3:::mybucket/*"]
        }]
    }"#;

    fn args<'a>(
        account: &'a str,
        action: S3Action,
        object: &'a str,
        ctx: &'a HashMap<String, Vec<String>>,
    ) -> Args<'a> {
        Args {
            account,
            action,
            bucket: "mybucket",
            object,
            is_owner: false,
            conditions: ctx,
        }
    }

    #[test]
    fn test_should_allow_matching_action_only() {
        let policy: Policy = PUBLIC_READ.parse().unwrap();
        let ctx = HashMap::new();
        assert!(policy.is_allowed(&args("", S3Action::GetObject, "x.txt", &ctx)));
        assert!(!policy.is_allowed(&args("", S3Action::PutObject, "x.txt", &ctx)));
        assert_eq!(
            policy.decide(&args("", S3Action::PutObject, "x.txt", &ctx)),
            PolicyDecision::Denied
        );
    }

    #[test]
    fn test_should_let_deny_override_allow() {
        let policy: Policy = r#"{
            "Version": "2012-10-17",
            "Statement": [
                {"Effect": "Allow", "Principal": {"AWS": ["*"]}, "Action": ["s3:GetObject"],
                 "Resource": ["arn:aws:s3:::mybucket/*"]},
                {"Effect": "Deny", "Principal": {"AWS": "bad-user"}, "Action": "s3:*",
                 "Resource": "arn:aws:s3:::mybucket/*"}
            ]
        }"#
        .parse()
        .unwrap();
        let ctx = HashMap::new();
        assert!(!policy.is_allowed(&args("bad-user", S3Action::GetObject, "x.txt", &ctx)));
        assert!(policy.is_allowed(&args("good-user", S3Action::GetObject, "x.txt", &ctx)));

        let mut owner = args("bad-user", S3Action::GetObject, "x.txt", &ctx);
        owner.is_owner = true;
        assert!(!policy.is_allowed(&owner));
    }

    #[test]
    fn test_should_let_owner_bypass_empty_policy() {
        let policy: Policy = r#"{"Version": "2012-10-17", "Statement": []}"#.parse().unwrap();
        let ctx = HashMap::new();
        let mut a = args("root", S3Action::DeleteBucket, "", &ctx);
        assert!(!policy.is_allowed(&a));
        a.is_owner = true;
        assert!(policy.is_allowed(&a));
    }

    #[test]
    fn test_should_scope_resources_by_username_variable() {
        let policy: Policy = r#"{
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Action": ["s3:GetObject"],
                "Resource": ["arn:aws:s3:::mybucket/${aws:username}/*"],
                "Condition": {"StringEquals": {"aws:username": "alice"}}
            }]
        }"#
        .parse()
        .unwrap();
        let ctx = HashMap::from([("username".to_owned(), vec!["alice".to_owned()])]);
        assert!(policy.is_allowed(&args("alice", S3Action::GetObject, "alice/file.txt", &ctx)));
        assert!(!policy.is_allowed(&args("alice", S3Action::GetObject, "bob/file.txt", &ctx)));

        let bob = HashMap::from([("username".to_owned(), vec!["bob".to_owned()])]);
        assert!(!policy.is_allowed(&args("bob", S3Action::GetObject, "bob/file.txt", &bob)));
    }

    #[test]
    fn test_should_reject_bad_versions_and_unknown_fields() {
        let bad_version = r#"{"Version": "2020-01-01", "Statement": []}"#;
        assert!(matches!(
            bad_version.parse::<Policy>(),
            Err(PolicyError::InvalidVersion(_))
        ));
        let unknown = r#"{"Version": "2012-10-17", "Statement": [], "Extra": 1}"#;
        assert!(matches!(unknown.parse::<Policy>(), Err(PolicyError::Json(_))));
        assert!(r#"{"Version": "2008-10-17", "Statement": []}"#.parse::<Policy>().is_ok());
    }

    #[test]
    fn test_should_accept_single_statement_object() {
        let policy: Policy = r#"{"Version": "2012-10-17", "Statement":
            {"Effect": "Allow", "Action": "s3:ListBucket", "Resource": "arn:aws:s3:::mybucket"}}"#
            .parse()
            .unwrap();
        assert_eq!(policy.statements.len(), 1);
    }

    #[test]
    fn test_should_validate_bucket_policy_resources() {
        assert!(Policy::parse_bucket_policy(PUBLIC_READ.as_bytes(), "mybucket").is_ok());
        assert!(matches!(
            Policy::parse_bucket_policy(PUBLIC_READ.as_bytes(), "otherbucket"),
            Err(PolicyError::ResourceOutsideBucket { .. })
        ));
    }

    #[test]
    fn test_should_compare_statements_regardless_of_order() {
        let a: Policy = r#"{"Version": "2012-10-17", "Statement": [
            {"Effect": "Allow", "Action": "s3:GetObject"},
            {"Effect": "Deny", "Action": ["s3:PutObject", "s3:DeleteObject"]}]}"#
            .parse()
            .unwrap();
        let b: Policy = r#"{"Version": "2012-10-17", "Statement": [
            {"Effect": "Deny", "Action": ["s3:DeleteObject", "s3:PutObject"]},
            {"Effect": "Allow", "Action": ["s3:GetObject"]}]}"#
            .parse()
            .unwrap();
        assert_eq!(a, b);

        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json.parse::<Policy>().unwrap(), a);
    }

    #[test]
    fn test_should_count_repeated_statements() {
        let allow = r#"{"Effect": "Allow", "Action": "s3:GetObject"}"#;
        let deny = r#"{"Effect": "Deny", "Action": "s3:PutObject"}"#;
        let policy = |statements: &[&str]| -> Policy {
            format!(r#"{{"Version": "2012-10-17", "Statement": [{}]}}"#, statements.join(","))
                .parse()
                .unwrap()
        };
        assert_ne!(policy(&[allow, allow, deny]), policy(&[allow, deny, deny]));
        assert_eq!(policy(&[allow, deny, allow]), policy(&[allow, allow, deny]));
    }
}
