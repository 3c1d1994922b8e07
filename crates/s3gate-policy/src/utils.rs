//! Wildcard matching, path cleaning and serde helpers shared by the policy
//! types.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

/// Match `text` against `pattern`, where `*` matches any run of characters
/// (including none) and `?` matches exactly one character.
///
/// ```
/// use s3gate_policy::wildcard_match;
///
/// assert!(wildcard_match("mybucket/*", "mybucket/a/b/c.txt"));
/// assert!(wildcard_match("mybucket/file?.txt", "mybucket/file1.txt"));
/// assert!(!wildcard_match("mybucket/*", "otherbucket/a"));
/// ```
#[must_use]
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    match pattern {
        "" => text.is_empty(),
        "*" => true,
        _ => deep_match(pattern, text, false),
    }
}

/// Like [`wildcard_match`] but only `*` is special; `?` is literal.
#[must_use]
pub fn wildcard_match_simple(pattern: &str, text: &str) -> bool {
    match pattern {
        "" => text.is_empty(),
        "*" => true,
        _ => deep_match(pattern, text, true),
    }
}

fn deep_match(pattern: &str, text: &str, simple: bool) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text offset it currently covers up to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == text[t] || (!simple && pattern[p] == '?')) {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Lexically clean a slash-separated path: collapse repeated slashes,
/// drop `.` segments, resolve `..` and strip any trailing slash.
///
/// An empty result is returned as `"."`.
#[must_use]
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Deserialize either a single string or an array of strings into a set.
pub(crate) fn deserialize_string_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => BTreeSet::from([s]),
        OneOrMany::Many(v) => v.into_iter().collect(),
    })
}
