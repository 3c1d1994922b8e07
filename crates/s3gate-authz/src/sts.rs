//! STS `AssumeRole`.
//!
//! A long-lived identity trades a SigV4 request signed for the `sts`
//! service for temporary credentials. The temporary credential inherits the
//! caller's policies and may be narrowed further by a session policy.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use s3gate_auth::hash_payload;
use s3gate_core::ServiceType;
use s3gate_iam::{Credential, PARENT_CLAIM, UserIdentity};
use s3gate_policy::Policy;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth_type::{AuthType, classify_auth_type};
use crate::authorizer::Authorizer;
use crate::error::ApiErrorCode;
use crate::xml::{XmlError, sts_response_to_xml, write_text_element};

/// STS API version accepted in the `Version` parameter.
pub const STS_API_VERSION: &str = "2011-06-15";

/// Shortest lifetime of a temporary credential.
pub const MIN_DURATION_SECS: i64 = 900;

/// Longest lifetime of a temporary credential.
pub const MAX_DURATION_SECS: i64 = 12 * 60 * 60;

/// Largest accepted session policy document.
pub const MAX_SESSION_POLICY_LEN: usize = 2048;

/// Temporary credentials issued by `AssumeRole`.
#[derive(Debug, Clone)]
pub struct AssumeRoleOutput {
    /// The new credential.
    pub credential: Credential,
    /// Request id reported in `ResponseMetadata`.
    pub request_id: String,
}

impl AssumeRoleOutput {
    /// Render the `AssumeRoleResponse` document.
    pub fn to_xml(&self) -> Result<Vec<u8>, XmlError> {
        let cred = &self.credential;
        let expiration = cred
            .expiration
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        sts_response_to_xml("AssumeRole", &self.request_id, |w| {
            w.create_element("Credentials").write_inner_content(|w| {
                write_text_element(w, "AccessKeyId", &cred.access_key)?;
                write_text_element(w, "SecretAccessKey", &cred.secret_key)?;
                write_text_element(w, "SessionToken", &cred.session_token)?;
                write_text_element(w, "Expiration", &expiration)
            })?;
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
struct AssumeRoleForm {
    action: Option<String>,
    version: Option<String>,
    duration_seconds: Option<String>,
    policy: Option<String>,
}

impl AssumeRoleForm {
    fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in form_urlencoded::parse(body) {
            let slot = match key.as_ref() {
                "Action" => &mut form.action,
                "Version" => &mut form.version,
                "DurationSeconds" => &mut form.duration_seconds,
                "Policy" => &mut form.policy,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        form
    }

    fn duration(&self, default_secs: i64) -> Result<i64, ApiErrorCode> {
        let secs = match self.duration_seconds.as_deref() {
            None | Some("") => default_secs,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ApiErrorCode::InvalidParameterValue)?,
        };
        if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
            Ok(secs)
        } else {
            Err(ApiErrorCode::InvalidDuration)
        }
    }

    fn session_policy(&self) -> Result<Option<Policy>, ApiErrorCode> {
        let Some(doc) = self.policy.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        if doc.len() > MAX_SESSION_POLICY_LEN {
            return Err(ApiErrorCode::InvalidParameterValue);
        }
        Policy::parse(doc.as_bytes()).map(Some).map_err(|e| {
            debug!(error = %e, "invalid session policy");
            ApiErrorCode::MalformedPolicy
        })
    }
}

impl Authorizer {
    /// Handle an `AssumeRole` call with form-encoded `body`.
    pub fn assume_role(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> Result<AssumeRoleOutput, ApiErrorCode> {
        self.assume_role_at(parts, body, Utc::now())
    }

    /// [`Authorizer::assume_role`] at a fixed instant.
    pub fn assume_role_at(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<AssumeRoleOutput, ApiErrorCode> {
        let auth_type = classify_auth_type(parts);
        match auth_type {
            AuthType::V4Header => {}
            AuthType::Anonymous => return Err(ApiErrorCode::AccessDenied),
            _ => return Err(ApiErrorCode::SignatureVersionNotSupported),
        }
        let payload_hash = hash_payload(body);
        let verified =
            self.verify_as(auth_type, parts, Some(&payload_hash), ServiceType::Sts, now)?;
        let caller = self.resolve_caller(&verified.access_key_id, auth_type, parts)?;
        if caller.parent.is_some() || caller.identity.credential.is_temp() {
            debug!(access_key = %verified.access_key_id, "temporary credentials cannot assume roles");
            return Err(ApiErrorCode::AccessDenied);
        }

        let form = AssumeRoleForm::parse(body);
        if form.action.as_deref() != Some("AssumeRole")
            || form.version.as_deref() != Some(STS_API_VERSION)
        {
            return Err(ApiErrorCode::InvalidParameterValue);
        }
        let duration = form.duration(self.config().sts_default_duration_secs)?;
        let session_policy = form.session_policy()?;

        let parent = caller.identity.credential.access_key;
        let expiration = now + Duration::seconds(duration);
        let mut claims = Map::new();
        claims.insert("exp".to_owned(), Value::from(expiration.timestamp()));
        claims.insert(PARENT_CLAIM.to_owned(), Value::from(parent.clone()));
        let credential =
            Credential::new_temporary_with_claims(claims, &self.config().root_secret_key)
                .map_err(ApiErrorCode::from)?;

        self.iam()
            .add_temp_user(&UserIdentity {
                credential: credential.clone(),
                policies: BTreeSet::new(),
                session_policy,
            })
            .map_err(ApiErrorCode::from)?;

        info!(
            parent = %parent,
            access_key = %credential.access_key,
            expiration = %expiration,
            "issued temporary credentials"
        );
        Ok(AssumeRoleOutput {
            credential,
            request_id: Uuid::new_v4().to_string(),
        })
    }
}
