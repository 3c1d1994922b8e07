//! Statement principals.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::{deserialize_string_set, wildcard_match_simple};

/// The `Principal` element of a statement.
///
/// Accepts `"*"`, `{"AWS": "name"}` and `{"AWS": ["a", "b"]}`; always
/// serializes as `{"AWS": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Principal {
    #[serde(rename = "AWS")]
    aws: BTreeSet<String>,
}

impl Principal {
    /// Principal covering the given identities or patterns.
    pub fn new<I, S>(aws: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aws: aws.into_iter().map(Into::into).collect(),
        }
    }

    /// Principal matching everyone, including anonymous callers.
    #[must_use]
    pub fn any() -> Self {
        Self::new(["*"])
    }

    /// Case-sensitive match of `account` against any entry; only `*` is a
    /// wildcard.
    #[must_use]
    pub fn is_match(&self, account: &str) -> bool {
        self.aws.iter().any(|p| wildcard_match_simple(p, account))
    }

    /// Whether no identity is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aws.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AwsPrincipal {
    #[serde(rename = "AWS", deserialize_with = "deserialize_string_set")]
    aws: BTreeSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrincipal {
    Wildcard(String),
    Aws(AwsPrincipal),
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawPrincipal::deserialize(deserializer)? {
            RawPrincipal::Wildcard(s) if s == "*" => Ok(Self::any()),
            RawPrincipal::Wildcard(s) => Err(serde::de::Error::custom(format!(
                "invalid principal {s:?}: expected \"*\" or an AWS object"
            ))),
            RawPrincipal::Aws(p) => Ok(Self { aws: p.aws }),
        }
    }
}
