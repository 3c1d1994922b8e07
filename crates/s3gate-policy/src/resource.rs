//! S3 resource ARNs.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PolicyError;
use crate::utils::{clean_path, deserialize_string_set, wildcard_match};
use crate::variables::substitute_variables;

/// ARN prefix of every S3 resource.
pub const S3_PREFIX: &str = "arn:aws:s3:::";

/// One `arn:aws:s3:::bucket[/key-glob]` resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource {
    pattern: String,
}

impl Resource {
    /// The pattern after the ARN prefix, e.g. `mybucket/photos/*`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The bucket part of the pattern, which may itself contain wildcards.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        self.pattern
            .split_once('/')
            .map_or(self.pattern.as_str(), |(bucket, _)| bucket)
    }

    /// Match a `bucket/object` path after substituting policy variables.
    ///
    /// A bucket-level path (`bucket/`) matches the bare bucket pattern.
    #[must_use]
    pub fn is_match(&self, resource: &str, values: &HashMap<String, Vec<String>>) -> bool {
        let pattern = substitute_variables(&self.pattern, values);

        let cleaned = clean_path(resource);
        if cleaned != "." && cleaned == pattern {
            return true;
        }

        wildcard_match(&pattern, resource)
    }

    /// Check that this resource can be attached to `bucket`'s policy.
    pub fn validate_bucket(&self, bucket: &str) -> Result<(), PolicyError> {
        if wildcard_match(self.bucket_name(), bucket) {
            Ok(())
        } else {
            Err(PolicyError::ResourceOutsideBucket {
                bucket: bucket.to_owned(),
                resource: self.to_string(),
            })
        }
    }
}

impl TryFrom<&str> for Resource {
    type Error = PolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let Some(pattern) = value.strip_prefix(S3_PREFIX) else {
            return Err(PolicyError::InvalidResource(value.to_owned()));
        };
        if pattern.is_empty() || pattern.starts_with('/') {
            return Err(PolicyError::InvalidResource(value.to_owned()));
        }
        Ok(Self {
            pattern: pattern.to_owned(),
        })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{S3_PREFIX}{}", self.pattern)
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Resource::try_from(value.as_str()).map_err(serde::de::Error::custom)
    }
}

/// The `Resource` element of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceSet(BTreeSet<Resource>);

impl ResourceSet {
    /// Build a set from parsed resources.
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self(resources.into_iter().collect())
    }

    /// Whether any resource matches `resource`.
    #[must_use]
    pub fn is_match(&self, resource: &str, values: &HashMap<String, Vec<String>>) -> bool {
        self.0.iter().any(|r| r.is_match(resource, values))
    }

    /// Check every resource against the bucket the policy is attached to.
    pub fn validate_bucket(&self, bucket: &str) -> Result<(), PolicyError> {
        self.0.iter().try_for_each(|r| r.validate_bucket(bucket))
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the resources.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for ResourceSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = deserialize_string_set(deserializer)?;
        raw.iter()
            .map(|s| Resource::try_from(s.as_str()).map_err(serde::de::Error::custom))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(resource: &str, path: &str) -> bool {
        Resource::try_from(resource)
            .unwrap()
            .is_match(path, &HashMap::new())
    }

    #[test]
    fn test_should_match_resource_patterns() {
        assert!(matches("arn:aws:s3:::*", "mybucket/"));
        assert!(matches("arn:aws:s3:::*", "mybucket/myobject"));
        assert!(matches("arn:aws:s3:::mybucket*", "mybucket/myobject"));
        assert!(matches("arn:aws:s3:::*/*", "mybucket/myobject"));
        assert!(matches("arn:aws:s3:::mybucket/*", "mybucket/any/nested/key"));
        assert!(matches("arn:aws:s3:::mybucket*/myobject", "mybucket100/myobject"));
        assert!(matches(
            "arn:aws:s3:::mybucket?0/2010/photos/*",
            "mybucket20/2010/photos/1.jpg"
        ));
        assert!(matches("arn:aws:s3:::mybucket", "mybucket/"));
    }

    #[test]
    fn test_should_not_match_other_buckets_or_objects() {
        assert!(!matches("arn:aws:s3:::mybucket/*", "otherbucket/any"));
        assert!(!matches("arn:aws:s3:::mybucket/*", "mybucket10/myobject"));
        assert!(!matches(
            "arn:aws:s3:::mybucket?0/2010/photos/*",
            "mybucket0/2010/photos/1.jpg"
        ));
        assert!(!matches("arn:aws:s3:::mybucket", "mybucket/myobject"));
    }

    #[test]
    fn test_should_substitute_variables_before_matching() {
        let resource = Resource::try_from("arn:aws:s3:::mybucket/${aws:username}/*").unwrap();
        let values = HashMap::from([("username".to_owned(), vec!["alice".to_owned()])]);
        assert!(resource.is_match("mybucket/alice/file.txt", &values));
        assert!(!resource.is_match("mybucket/bob/file.txt", &values));
        assert!(!resource.is_match("mybucket/alice/file.txt", &HashMap::new()));
    }

    #[test]
    fn test_should_reject_non_s3_resources() {
        assert!(Resource::try_from("arn:aws:iam:::user/alice").is_err());
        assert!(Resource::try_from("arn:aws:s3:::").is_err());
        assert!(Resource::try_from("arn:aws:s3:::/bucket").is_err());
        assert!(serde_json::from_str::<ResourceSet>(r#"["mybucket"]"#).is_err());
    }

    #[test]
    fn test_should_validate_bucket_ownership() {
        let set: ResourceSet =
            serde_json::from_str(r#"["arn:aws:s3:::mybucket", "arn:aws:s3:::mybucket/*"]"#)
                .unwrap();
        assert!(set.validate_bucket("mybucket").is_ok());
        assert!(matches!(
            set.validate_bucket("other"),
            Err(PolicyError::ResourceOutsideBucket { .. })
        ));
        let wild: ResourceSet = serde_json::from_str(r#""arn:aws:s3:::my*/*""#).unwrap();
        assert!(wild.validate_bucket("mybucket").is_ok());
    }

    #[test]
    fn test_should_serialize_with_arn_prefix() {
        let set: ResourceSet = serde_json::from_str(r#""arn:aws:s3:::b/*""#).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["arn:aws:s3:::b/*"]"#);
    }
}
