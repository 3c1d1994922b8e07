//! HS512 session tokens.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::IamResult;

/// Claim naming the access key a token authenticates as.
pub const ACCESS_KEY_CLAIM: &str = "accessKey";

/// Claim naming the user whose policies a temporary credential inherits.
pub const PARENT_CLAIM: &str = "parent";

/// Claims read back from a bearer or session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Access key the token authenticates as.
    #[serde(rename = "accessKey")]
    pub access_key: String,
    /// Parent user, empty for long-lived identities.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Sign `claims` with HMAC-SHA-512 under `secret`.
pub fn generate_jwt<T: Serialize>(claims: &T, secret: &str) -> IamResult<String> {
    let header = Header::new(Algorithm::HS512);
    Ok(jsonwebtoken::encode(
        &header,
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verify an HS512 token and its `exp` claim, returning the claims.
pub fn extract_claims<T: DeserializeOwned>(token: &str, secret: &str) -> IamResult<T> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.leeway = 0;
    let data = jsonwebtoken::decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::error::IamError;

    fn claims(exp: i64) -> SessionClaims {
        SessionClaims {
            access_key: "TEMPKEY".to_owned(),
            parent: "alice".to_owned(),
            exp,
        }
    }

    #[test]
    fn test_should_round_trip_claims() {
        let exp = Utc::now().timestamp() + 600;
        let token = generate_jwt(&claims(exp), "rootsecret").unwrap();
        let decoded: SessionClaims = extract_claims(&token, "rootsecret").unwrap();
        assert_eq!(decoded, claims(exp));
    }

    #[test]
    fn test_should_reject_wrong_secret_and_expired_tokens() {
        let exp = Utc::now().timestamp() + 600;
        let token = generate_jwt(&claims(exp), "rootsecret").unwrap();
        assert!(matches!(
            extract_claims::<SessionClaims>(&token, "othersecret"),
            Err(IamError::Token(_))
        ));

        let expired = generate_jwt(&claims(Utc::now().timestamp() - 10), "rootsecret").unwrap();
        assert!(extract_claims::<SessionClaims>(&expired, "rootsecret").is_err());
    }
}
