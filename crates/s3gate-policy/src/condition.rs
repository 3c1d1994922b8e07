//! Condition functions.
//!
//! A statement's `Condition` block maps operator names to `{key: values}`
//! objects. Each `(operator, key)` pair becomes one [`ConditionFunction`];
//! a statement's conditions hold when every function holds.
//!
//! ```json
//! "Condition": {
//!     "StringEquals": {"aws:username": "alice"},
//!     "StringLike": {"s3:prefix": ["home/${aws:username}/*", "public/*"]},
//!     "Null": {"s3:x-amz-server-side-encryption": "false"}
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::PolicyError;
use crate::utils::wildcard_match;
use crate::variables::{context_key_name, substitute_variables};

const KEY_NAMESPACES: [&str; 3] = ["aws:", "s3:", "jwt:"];

/// A string-valued condition: the key and its comparison values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StringCondition {
    key: String,
    values: BTreeSet<String>,
}

impl StringCondition {
    /// Condition on `key` against `values`.
    pub fn new<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn equals(&self, context: &HashMap<String, Vec<String>>, ignore_case: bool) -> bool {
        let fold = |s: &str| {
            if ignore_case {
                s.to_lowercase()
            } else {
                s.to_owned()
            }
        };
        let expected: BTreeSet<String> = self
            .values
            .iter()
            .map(|v| fold(&substitute_variables(v, context)))
            .collect();
        request_values(context, &self.key)
            .iter()
            .any(|v| expected.contains(&fold(v)))
    }

    fn like(&self, context: &HashMap<String, Vec<String>>) -> bool {
        let patterns: Vec<String> = self
            .values
            .iter()
            .map(|v| substitute_variables(v, context))
            .collect();
        request_values(context, &self.key)
            .iter()
            .any(|v| patterns.iter().any(|p| wildcard_match(p, v)))
    }
}

/// A `BinaryEquals` condition; values are held base64-decoded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BinaryCondition {
    key: String,
    values: BTreeSet<Vec<u8>>,
}

/// A `Null` condition: `true` requires the key to be absent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NullCondition {
    key: String,
    value: bool,
}

/// One condition operator applied to one key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConditionFunction {
    /// Some request value equals some comparison value.
    StringEquals(StringCondition),
    /// Negation of `StringEquals`.
    StringNotEquals(StringCondition),
    /// `StringEquals` after case folding.
    StringEqualsIgnoreCase(StringCondition),
    /// Negation of `StringEqualsIgnoreCase`.
    StringNotEqualsIgnoreCase(StringCondition),
    /// Some request value wildcard-matches some comparison value.
    StringLike(StringCondition),
    /// Negation of `StringLike`.
    StringNotLike(StringCondition),
    /// Some request value equals some base64-decoded comparison value.
    BinaryEquals(BinaryCondition),
    /// Key presence check.
    Null(NullCondition),
}

impl ConditionFunction {
    /// Operator name as written in policy JSON.
    #[must_use]
    pub fn operator(&self) -> &'static str {
        match self {
            Self::StringEquals(_) => "StringEquals",
            Self::StringNotEquals(_) => "StringNotEquals",
            Self::StringEqualsIgnoreCase(_) => "StringEqualsIgnoreCase",
            Self::StringNotEqualsIgnoreCase(_) => "StringNotEqualsIgnoreCase",
            Self::StringLike(_) => "StringLike",
            Self::StringNotLike(_) => "StringNotLike",
            Self::BinaryEquals(_) => "BinaryEquals",
            Self::Null(_) => "Null",
        }
    }

    /// Condition key, e.g. `aws:username`.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::StringEquals(c)
            | Self::StringNotEquals(c)
            | Self::StringEqualsIgnoreCase(c)
            | Self::StringNotEqualsIgnoreCase(c)
            | Self::StringLike(c)
            | Self::StringNotLike(c) => &c.key,
            Self::BinaryEquals(c) => &c.key,
            Self::Null(c) => &c.key,
        }
    }

    /// Evaluate against the per-request context.
    #[must_use]
    pub fn evaluate(&self, context: &HashMap<String, Vec<String>>) -> bool {
        match self {
            Self::StringEquals(c) => c.equals(context, false),
            Self::StringNotEquals(c) => !c.equals(context, false),
            Self::StringEqualsIgnoreCase(c) => c.equals(context, true),
            Self::StringNotEqualsIgnoreCase(c) => !c.equals(context, true),
            Self::StringLike(c) => c.like(context),
            Self::StringNotLike(c) => !c.like(context),
            Self::BinaryEquals(c) => request_values(context, &c.key)
                .iter()
                .any(|v| c.values.contains(v.as_bytes())),
            Self::Null(c) => request_values(context, &c.key).is_empty() == c.value,
        }
    }

    /// Build a function from one `{key: value}` entry of an operator block.
    pub fn parse(operator: &str, key: &str, raw: &Value) -> Result<Self, PolicyError> {
        if key.is_empty() || !KEY_NAMESPACES.iter().any(|ns| key.starts_with(ns)) {
            return Err(PolicyError::InvalidCondition(format!(
                "unknown condition key {key:?}"
            )));
        }
        let key = key.to_owned();

        let string = |values| StringCondition {
            key: key.clone(),
            values,
        };
        Ok(match operator {
            "StringEquals" => Self::StringEquals(string(string_values(operator, &key, raw)?)),
            "StringNotEquals" => Self::StringNotEquals(string(string_values(operator, &key, raw)?)),
            "StringEqualsIgnoreCase" => {
                Self::StringEqualsIgnoreCase(string(string_values(operator, &key, raw)?))
            }
            "StringNotEqualsIgnoreCase" => {
                Self::StringNotEqualsIgnoreCase(string(string_values(operator, &key, raw)?))
            }
            "StringLike" => Self::StringLike(string(string_values(operator, &key, raw)?)),
            "StringNotLike" => Self::StringNotLike(string(string_values(operator, &key, raw)?)),
            "BinaryEquals" => {
                let values = string_values(operator, &key, raw)?
                    .iter()
                    .map(|v| {
                        STANDARD.decode(v).map_err(|e| {
                            PolicyError::InvalidCondition(format!(
                                "BinaryEquals value for {key} is not base64: {e}"
                            ))
                        })
                    })
                    .collect::<Result<_, _>>()?;
                Self::BinaryEquals(BinaryCondition {
                    key: key.clone(),
                    values,
                })
            }
            "Null" => {
                let value = match raw {
                    Value::Bool(b) => *b,
                    Value::String(s) if s.eq_ignore_ascii_case("true") => true,
                    Value::String(s) if s.eq_ignore_ascii_case("false") => false,
                    _ => {
                        return Err(PolicyError::InvalidCondition(format!(
                            "Null value for {key} must be a boolean"
                        )));
                    }
                };
                Self::Null(NullCondition {
                    key: key.clone(),
                    value,
                })
            }
            other if other.contains(':') => {
                return Err(PolicyError::InvalidCondition(format!(
                    "unsupported condition qualifier in {other:?}"
                )));
            }
            other => {
                return Err(PolicyError::InvalidCondition(format!(
                    "unknown condition operator {other:?}"
                )));
            }
        })
    }

    fn json_values(&self) -> Value {
        match self {
            Self::StringEquals(c)
            | Self::StringNotEquals(c)
            | Self::StringEqualsIgnoreCase(c)
            | Self::StringNotEqualsIgnoreCase(c)
            | Self::StringLike(c)
            | Self::StringNotLike(c) => Value::from(c.values.iter().cloned().collect::<Vec<_>>()),
            Self::BinaryEquals(c) => {
                Value::from(c.values.iter().map(|v| STANDARD.encode(v)).collect::<Vec<_>>())
            }
            Self::Null(c) => Value::Bool(c.value),
        }
    }
}

fn request_values<'a>(context: &'a HashMap<String, Vec<String>>, key: &str) -> &'a [String] {
    context
        .get(context_key_name(key))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_values(operator: &str, key: &str, raw: &Value) -> Result<BTreeSet<String>, PolicyError> {
    let invalid = || {
        PolicyError::InvalidCondition(format!(
            "{operator} value for {key} must be a string or an array of strings"
        ))
    };
    let values: BTreeSet<String> = match raw {
        Value::Array(items) => items
            .iter()
            .map(|v| scalar_to_string(v).ok_or_else(invalid))
            .collect::<Result<_, _>>()?,
        other => BTreeSet::from([scalar_to_string(other).ok_or_else(invalid)?]),
    };
    if values.is_empty() {
        return Err(PolicyError::InvalidCondition(format!(
            "{operator} for {key} has no values"
        )));
    }
    Ok(values)
}

/// The `Condition` element of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(BTreeSet<ConditionFunction>);

impl Conditions {
    /// Build from individual functions.
    pub fn new(functions: impl IntoIterator<Item = ConditionFunction>) -> Self {
        Self(functions.into_iter().collect())
    }

    /// True when every function holds; an empty block always holds.
    #[must_use]
    pub fn evaluate(&self, context: &HashMap<String, Vec<String>>) -> bool {
        self.0.iter().all(|f| f.evaluate(context))
    }

    /// Whether there are no functions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the functions.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionFunction> {
        self.0.iter()
    }
}

impl Serialize for Conditions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, Value>> = BTreeMap::new();
        for function in &self.0 {
            grouped
                .entry(function.operator())
                .or_default()
                .insert(function.key(), function.json_values());
        }

        let mut map = serializer.serialize_map(Some(grouped.len()))?;
        for (operator, block) in &grouped {
            map.serialize_entry(operator, block)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ConditionsVisitor;

        impl<'de> Visitor<'de> for ConditionsVisitor {
            type Value = Conditions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of condition operators")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut seen = BTreeSet::new();
                let mut functions = BTreeSet::new();
                while let Some(operator) = map.next_key::<String>()? {
                    if !seen.insert(operator.clone()) {
                        return Err(de::Error::custom(format!(
                            "duplicate condition operator `{operator}`"
                        )));
                    }
                    let block: BTreeMap<String, Value> = map.next_value()?;
                    if block.is_empty() {
                        return Err(de::Error::custom(format!(
                            "condition operator `{operator}` has no keys"
                        )));
                    }
                    for (key, raw) in &block {
                        let function = ConditionFunction::parse(&operator, key, raw)
                            .map_err(de::Error::custom)?;
                        functions.insert(function);
                    }
                }
                Ok(Conditions(functions))
            }
        }

        deserializer.deserialize_map(ConditionsVisitor)
    }
}
