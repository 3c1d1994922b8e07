//! S3 actions and policy action sets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PolicyError;
use crate::utils::{deserialize_string_set, wildcard_match};

const S3_PREFIX: &str = "s3:";

/// Pattern matching every S3 action.
pub const ALL_ACTIONS: &str = "s3:*";

macro_rules! s3_actions {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// An S3 operation checked by the authorizer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum S3Action {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl S3Action {
            /// Every known action.
            pub const ALL: &'static [S3Action] = &[$(S3Action::$variant),+];

            /// Canonical `s3:` name of the action.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(S3Action::$variant => $name,)+
                }
            }
        }

        impl FromStr for S3Action {
            type Err = PolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(S3Action::$variant),)+
                    _ => Err(PolicyError::InvalidAction(s.to_owned())),
                }
            }
        }
    };
}

s3_actions! {
    AbortMultipartUpload => "s3:AbortMultipartUpload",
    BypassGovernanceRetention => "s3:BypassGovernanceRetention",
    CreateBucket => "s3:CreateBucket",
    DeleteBucket => "s3:DeleteBucket",
    DeleteBucketCors => "s3:DeleteBucketCors",
    DeleteBucketPolicy => "s3:DeleteBucketPolicy",
    DeleteObject => "s3:DeleteObject",
    DeleteObjectTagging => "s3:DeleteObjectTagging",
    DeleteObjectVersion => "s3:DeleteObjectVersion",
    DeleteObjectVersionTagging => "s3:DeleteObjectVersionTagging",
    ForceDeleteBucket => "s3:ForceDeleteBucket",
    GetBucketCors => "s3:GetBucketCors",
    GetBucketEncryption => "s3:GetEncryptionConfiguration",
    GetBucketLifecycle => "s3:GetLifecycleConfiguration",
    GetBucketLocation => "s3:GetBucketLocation",
    GetBucketNotification => "s3:GetBucketNotification",
    GetBucketObjectLockConfiguration => "s3:GetBucketObjectLockConfiguration",
    GetBucketPolicy => "s3:GetBucketPolicy",
    GetBucketPolicyStatus => "s3:GetBucketPolicyStatus",
    GetBucketTagging => "s3:GetBucketTagging",
    GetBucketVersioning => "s3:GetBucketVersioning",
    GetObject => "s3:GetObject",
    GetObjectAttributes => "s3:GetObjectAttributes",
    GetObjectLegalHold => "s3:GetObjectLegalHold",
    GetObjectRetention => "s3:GetObjectRetention",
    GetObjectTagging => "s3:GetObjectTagging",
    GetObjectVersion => "s3:GetObjectVersion",
    GetObjectVersionTagging => "s3:GetObjectVersionTagging",
    HeadBucket => "s3:HeadBucket",
    ListAllMyBuckets => "s3:ListAllMyBuckets",
    ListBucket => "s3:ListBucket",
    ListBucketMultipartUploads => "s3:ListBucketMultipartUploads",
    ListBucketVersions => "s3:ListBucketVersions",
    ListMultipartUploadParts => "s3:ListMultipartUploadParts",
    PutBucketCors => "s3:PutBucketCors",
    PutBucketEncryption => "s3:PutEncryptionConfiguration",
    PutBucketLifecycle => "s3:PutLifecycleConfiguration",
    PutBucketNotification => "s3:PutBucketNotification",
    PutBucketObjectLockConfiguration => "s3:PutBucketObjectLockConfiguration",
    PutBucketPolicy => "s3:PutBucketPolicy",
    PutBucketTagging => "s3:PutBucketTagging",
    PutBucketVersioning => "s3:PutBucketVersioning",
    PutObject => "s3:PutObject",
    PutObjectLegalHold => "s3:PutObjectLegalHold",
    PutObjectRetention => "s3:PutObjectRetention",
    PutObjectTagging => "s3:PutObjectTagging",
    PutObjectVersionTagging => "s3:PutObjectVersionTagging",
    RestoreObject => "s3:RestoreObject",
}

impl S3Action {
    /// Listing actions that fall back to the bucket policy when the IAM
    /// policy of the caller does not grant them.
    #[must_use]
    pub fn is_list_type(self) -> bool {
        matches!(
            self,
            Self::ListBucket
                | Self::ListBucketVersions
                | Self::ListBucketMultipartUploads
                | Self::ListMultipartUploadParts
        )
    }
}

impl fmt::Display for S3Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a statement's `Action` list: a known action or a wildcard
/// pattern such as `s3:Get*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Whether this entry covers `action`.
    #[must_use]
    pub fn is_match(&self, action: S3Action) -> bool {
        wildcard_match(&self.0, action.as_str())
    }

    /// The action pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Action {
    type Error = PolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == "*" {
            return Ok(Self(ALL_ACTIONS.to_owned()));
        }
        let Some(name) = value.strip_prefix(S3_PREFIX) else {
            return Err(PolicyError::InvalidAction(value.to_owned()));
        };
        if name.is_empty() {
            return Err(PolicyError::InvalidAction(value.to_owned()));
        }
        if !name.contains(['*', '?']) {
            S3Action::from_str(value)?;
        }
        Ok(Self(value.to_owned()))
    }
}

impl From<S3Action> for Action {
    fn from(action: S3Action) -> Self {
        Self(action.as_str().to_owned())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `Action` element of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<Action>);

impl ActionSet {
    /// Build a set from already-validated actions.
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self(actions.into_iter().collect())
    }

    /// Whether any entry covers `action`.
    #[must_use]
    pub fn is_match(&self, action: S3Action) -> bool {
        self.0.iter().any(|a| a.is_match(action))
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = deserialize_string_set(deserializer)?;
        raw.iter()
            .map(|s| Action::try_from(s.as_str()).map_err(serde::de::Error::custom))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_every_action_name() {
        for action in S3Action::ALL {
            assert_eq!(S3Action::from_str(action.as_str()).unwrap(), *action);
        }
    }

    #[test]
    fn test_should_match_all_actions_wildcard() {
        let set: ActionSet = serde_json::from_str(r#""*""#).unwrap();
        assert_eq!(set.iter().next().unwrap().as_str(), ALL_ACTIONS);
        assert!(S3Action::ALL.iter().all(|a| set.is_match(*a)));
    }

    #[test]
    fn test_should_match_prefix_patterns() {
        let set: ActionSet = serde_json::from_str(r#"["s3:Get*", "s3:ListBucket"]"#).unwrap();
        assert!(set.is_match(S3Action::GetObject));
        assert!(set.is_match(S3Action::GetBucketPolicy));
        assert!(set.is_match(S3Action::ListBucket));
        assert!(!set.is_match(S3Action::ListBucketVersions));
        assert!(!set.is_match(S3Action::PutObject));
    }

    #[test]
    fn test_should_reject_unknown_actions() {
        assert!(Action::try_from("s3:FlyToTheMoon").is_err());
        assert!(Action::try_from("ec2:RunInstances").is_err());
        assert!(Action::try_from("s3:").is_err());
        assert!(serde_json::from_str::<ActionSet>(r#"["s3:GetObject", "bogus"]"#).is_err());
    }

    #[test]
    fn test_should_classify_list_actions() {
        assert!(S3Action::ListBucketVersions.is_list_type());
        assert!(!S3Action::ListAllMyBuckets.is_list_type());
        assert!(!S3Action::GetObject.is_list_type());
    }
}
