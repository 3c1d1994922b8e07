use serde::{Deserialize, Serialize};

/// Whether a matching statement grants or refuses access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Refuse access, overriding any grant.
    Deny,
}

impl Effect {
    /// Map a statement predicate to an allow decision.
    ///
    /// For `Allow` the decision is the predicate; for `Deny` it is inverted,
    /// so a matching deny statement yields `false`.
    #[must_use]
    pub fn is_allowed(self, matched: bool) -> bool {
        match self {
            Self::Allow => matched,
            Self::Deny => !matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_invert_deny() {
        assert!(Effect::Allow.is_allowed(true));
        assert!(!Effect::Allow.is_allowed(false));
        assert!(!Effect::Deny.is_allowed(true));
        assert!(Effect::Deny.is_allowed(false));
    }

    #[test]
    fn test_should_reject_unknown_effect() {
        assert!(serde_json::from_str::<Effect>(r#""Allow""#).is_ok());
        assert!(serde_json::from_str::<Effect>(r#""allow""#).is_err());
        assert!(serde_json::from_str::<Effect>(r#""Maybe""#).is_err());
    }
}
