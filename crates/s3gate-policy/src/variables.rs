//! Policy variable substitution.
//!
//! Resource patterns and condition values may embed `${aws:username}`-style
//! placeholders. They are replaced with the first value the request context
//! holds for the key with its namespace prefix stripped (`aws:username` →
//! `username`). Unknown variables are left untouched so they can never
//! widen a match.

use std::collections::HashMap;

const KEY_PREFIXES: [&str; 3] = ["aws:", "s3:", "jwt:"];

/// Strip the `aws:`, `s3:` or `jwt:` namespace from a condition key.
#[must_use]
pub fn context_key_name(key: &str) -> &str {
    KEY_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .unwrap_or(key)
}

/// Replace every `${...}` variable in `input` using `values`.
///
/// The escapes `${*}`, `${?}` and `${$}` produce the literal character.
///
/// ```
/// use std::collections::HashMap;
/// use s3gate_policy::substitute_variables;
///
/// let values = HashMap::from([("username".to_owned(), vec!["alice".to_owned()])]);
/// assert_eq!(
///     substitute_variables("mybucket/${aws:username}/*", &values),
///     "mybucket/alice/*"
/// );
/// ```
#[must_use]
pub fn substitute_variables(input: &str, values: &HashMap<String, Vec<String>>) -> String {
    if !input.contains("${") {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match name {
            "*" | "?" | "$" => out.push_str(name),
            _ => match values
                .get(context_key_name(name))
                .and_then(|v| v.first())
            {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[start..start + 2 + end + 1]),
            },
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> HashMap<String, Vec<String>> {
        HashMap::from([
            ("username".to_owned(), vec!["alice".to_owned()]),
            ("userid".to_owned(), vec!["AKIAALICE".to_owned()]),
            ("prefix".to_owned(), vec!["photos/".to_owned()]),
            ("empty".to_owned(), vec![]),
        ])
    }

    #[test]
    fn test_should_substitute_known_variables() {
        assert_eq!(
            substitute_variables("b/${aws:username}/${aws:userid}", &values()),
            "b/alice/AKIAALICE"
        );
        assert_eq!(substitute_variables("${s3:prefix}*", &values()), "photos/*");
    }

    #[test]
    fn test_should_leave_unknown_variables_verbatim() {
        assert_eq!(
            substitute_variables("b/${aws:nobody}/x", &values()),
            "b/${aws:nobody}/x"
        );
        assert_eq!(substitute_variables("b/${aws:empty}", &values()), "b/${aws:empty}");
    }

    #[test]
    fn test_should_handle_escapes_and_unterminated_variables() {
        assert_eq!(substitute_variables("a${*}b${?}${$}", &values()), "a*b?$");
        assert_eq!(substitute_variables("a/${aws:username", &values()), "a/${aws:username");
        assert_eq!(substitute_variables("plain", &values()), "plain");
    }

    #[test]
    fn test_should_strip_key_namespace() {
        assert_eq!(context_key_name("aws:username"), "username");
        assert_eq!(context_key_name("s3:x-amz-copy-source"), "x-amz-copy-source");
        assert_eq!(context_key_name("jwt:sub"), "sub");
        assert_eq!(context_key_name("user-agent"), "user-agent");
    }
}
