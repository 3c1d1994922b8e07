//! The authorization orchestrator.
//!
//! [`Authorizer::authorize`] classifies the request, verifies its signature,
//! resolves the calling identity (the parent user for temporary
//! credentials) and evaluates policies:
//!
//! - anonymous requests are decided by the bucket policy alone;
//! - signed requests by the IAM policies attached to the identity, narrowed
//!   by the session policy of a temporary credential;
//! - `s3:ListBucketVersions` is retried once as `s3:ListBucket`;
//! - list operations a user's IAM policy does not grant fall back to the
//!   bucket policy.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use s3gate_auth::{
    AuthResult, CredentialProvider, StreamingContext, VerifyContext, verify_presigned,
    verify_presigned_v2, verify_sigv2, verify_sigv4, verify_streaming,
};
use s3gate_core::{GateConfig, KvStore, ServiceType};
use s3gate_iam::{
    Credential, IamResult, IamStore, SessionClaims, UserIdentity, extract_claims,
};
use s3gate_policy::{
    Args, DEFAULT_VERSION, Policy, PolicyDecision, PrincipalType, RequestIdentity, S3Action,
    build_condition_values,
};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::auth_type::{AuthType, bearer_token, classify_auth_type};
use crate::error::ApiErrorCode;

/// Header carrying the session token of a temporary credential.
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";

/// Query parameter carrying the session token of a presigned request.
pub const SECURITY_TOKEN_QUERY: &str = "X-Amz-Security-Token";

/// One S3 operation to authorize.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizeRequest<'a> {
    /// Method, URI and headers of the request.
    pub parts: &'a http::request::Parts,
    /// SHA-256 of the body, when the caller has it.
    pub payload_hash: Option<&'a str>,
    /// Operation being performed.
    pub action: S3Action,
    /// Target bucket; empty for service-level operations.
    pub bucket: &'a str,
    /// Target object key; empty for bucket-level operations.
    pub object: &'a str,
}

impl<'a> AuthorizeRequest<'a> {
    /// Request for `action` on `bucket/object`.
    #[must_use]
    pub fn new(
        parts: &'a http::request::Parts,
        action: S3Action,
        bucket: &'a str,
        object: &'a str,
    ) -> Self {
        Self {
            parts,
            payload_hash: None,
            action,
            bucket,
            object,
        }
    }

    /// Attach the hash of the body.
    #[must_use]
    pub fn with_payload_hash(mut self, payload_hash: &'a str) -> Self {
        self.payload_hash = Some(payload_hash);
        self
    }
}

/// Outcome of [`Authorizer::authorize`].
///
/// Callers must not perform the operation unless [`Authorization::is_allowed`].
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Identity policies were evaluated for: the parent user's credential for
    /// temporary credentials. `None` for anonymous or unverified requests.
    pub credential: Option<Credential>,
    /// Access key that signed the request; empty when anonymous.
    pub access_key: String,
    /// Whether the identity is the owner account.
    pub is_owner: bool,
    /// [`ApiErrorCode::None`] on success.
    pub code: ApiErrorCode,
}

impl Authorization {
    fn unauthenticated(code: ApiErrorCode) -> Self {
        Self {
            credential: None,
            access_key: String::new(),
            is_owner: false,
            code,
        }
    }

    /// Whether the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.code.is_none()
    }

    /// `Ok(self)` when allowed, the error code otherwise.
    pub fn into_result(self) -> Result<Self, ApiErrorCode> {
        if self.is_allowed() {
            Ok(self)
        } else {
            Err(self.code)
        }
    }
}

/// A verified caller.
#[derive(Debug)]
pub(crate) struct Caller {
    /// Identity of the access key that signed the request.
    pub(crate) identity: UserIdentity,
    /// Parent user of a temporary credential.
    pub(crate) parent: Option<UserIdentity>,
}

impl Caller {
    /// Identity whose policies apply.
    pub(crate) fn policy_identity(&self) -> &UserIdentity {
        self.parent.as_ref().unwrap_or(&self.identity)
    }
}

/// Authenticates and authorizes requests against an [`IamStore`].
#[derive(Debug, Clone)]
pub struct Authorizer {
    iam: IamStore,
    config: GateConfig,
}

impl Authorizer {
    /// Orchestrator over `iam`.
    #[must_use]
    pub fn new(iam: IamStore, config: GateConfig) -> Self {
        Self { iam, config }
    }

    /// Orchestrator over `store`, with the root account taken from `config`.
    pub fn from_config(store: Arc<dyn KvStore>, config: GateConfig) -> IamResult<Self> {
        let root = Credential::new(
            config.root_access_key.clone(),
            config.root_secret_key.clone(),
        )?;
        Ok(Self::new(IamStore::new(store, root), config))
    }

    /// The IAM store.
    #[must_use]
    pub fn iam(&self) -> &IamStore {
        &self.iam
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    fn verify_context(&self, service: ServiceType, now: DateTime<Utc>) -> VerifyContext {
        VerifyContext::new(service, self.config.region.clone())
            .with_now(now)
            .with_max_clock_skew(Duration::seconds(self.config.max_clock_skew_secs))
    }

    // ---------------------------------------------------------------------
    // Signature verification
    // ---------------------------------------------------------------------

    /// Verify the signature of a request to `service`.
    pub fn verify_signature(
        &self,
        parts: &http::request::Parts,
        payload_hash: Option<&str>,
        service: ServiceType,
    ) -> Result<AuthResult, ApiErrorCode> {
        self.verify_signature_at(parts, payload_hash, service, Utc::now())
    }

    /// [`Authorizer::verify_signature`] at a fixed instant.
    pub fn verify_signature_at(
        &self,
        parts: &http::request::Parts,
        payload_hash: Option<&str>,
        service: ServiceType,
        now: DateTime<Utc>,
    ) -> Result<AuthResult, ApiErrorCode> {
        let auth_type = classify_auth_type(parts);
        let result = self.verify_as(auth_type, parts, payload_hash, service, now)?;
        let identity = self
            .iam
            .find_identity(&result.access_key_id)
            .map_err(ApiErrorCode::from)?;
        if auth_type != AuthType::Jwt {
            check_session_token(&identity.credential, parts)?;
        }
        Ok(result)
    }

    /// Verify the seed request of an `aws-chunked` upload and return the
    /// state for checking its chunks.
    pub fn streaming_context_at(
        &self,
        parts: &http::request::Parts,
        now: DateTime<Utc>,
    ) -> Result<StreamingContext, ApiErrorCode> {
        let ctx = self.verify_context(ServiceType::S3, now);
        let stream = verify_streaming(parts, &self.iam, &ctx).map_err(|e| {
            debug!(error = %e, "streaming seed verification failed");
            ApiErrorCode::from(&e)
        })?;
        let identity = self
            .iam
            .find_identity(&stream.auth().access_key_id)
            .map_err(ApiErrorCode::from)?;
        check_session_token(&identity.credential, parts)?;
        Ok(stream)
    }

    pub(crate) fn verify_as(
        &self,
        auth_type: AuthType,
        parts: &http::request::Parts,
        payload_hash: Option<&str>,
        service: ServiceType,
        now: DateTime<Utc>,
    ) -> Result<AuthResult, ApiErrorCode> {
        let ctx = self.verify_context(service, now);
        let result = match auth_type {
            AuthType::V2Header => verify_sigv2(parts, &self.iam),
            AuthType::V2Presigned => verify_presigned_v2(parts, &self.iam, &ctx),
            AuthType::V4Header => verify_sigv4(parts, payload_hash, &self.iam, &ctx),
            AuthType::V4Presigned => verify_presigned(parts, &self.iam, &ctx),
            AuthType::Streaming => {
                verify_streaming(parts, &self.iam, &ctx).map(|stream| stream.auth().clone())
            }
            AuthType::Jwt => return self.verify_bearer(parts),
            AuthType::Anonymous => return Err(ApiErrorCode::AccessDenied),
            AuthType::Unknown => return Err(ApiErrorCode::SignatureVersionNotSupported),
        };
        result.map_err(|e| {
            debug!(%auth_type, error = %e, "signature verification failed");
            ApiErrorCode::from(&e)
        })
    }

    fn verify_bearer(&self, parts: &http::request::Parts) -> Result<AuthResult, ApiErrorCode> {
        let token = bearer_token(parts).ok_or(ApiErrorCode::InvalidToken)?;
        let claims: SessionClaims =
            extract_claims(token, &self.config.root_secret_key).map_err(|e| {
                debug!(error = %e, "rejected bearer token");
                ApiErrorCode::InvalidToken
            })?;
        // Session tokens are signed with the same key; they only count
        // alongside a signature from the temporary secret.
        if !claims.parent.is_empty() {
            debug!(access_key = %claims.access_key, "session token presented as bearer");
            return Err(ApiErrorCode::InvalidToken);
        }
        self.iam
            .get_secret_key(&claims.access_key)
            .map_err(ApiErrorCode::from)?;
        let identity = self
            .iam
            .find_identity(&claims.access_key)
            .map_err(ApiErrorCode::from)?;
        let credential = &identity.credential;
        if credential.is_temp() || !credential.parent_user.is_empty() {
            debug!(access_key = %claims.access_key, "bearer token names a temporary credential");
            return Err(ApiErrorCode::InvalidToken);
        }
        debug!(access_key = %claims.access_key, "bearer token verified");
        Ok(AuthResult {
            access_key_id: claims.access_key,
            region: String::new(),
            service: String::new(),
            signed_headers: Vec::new(),
        })
    }

    /// Resolve the verified `access_key`, check its session token and load
    /// its parent user.
    pub(crate) fn resolve_caller(
        &self,
        access_key: &str,
        auth_type: AuthType,
        parts: &http::request::Parts,
    ) -> Result<Caller, ApiErrorCode> {
        let identity = self
            .iam
            .find_identity(access_key)
            .map_err(ApiErrorCode::from)?;
        if auth_type != AuthType::Jwt {
            check_session_token(&identity.credential, parts)?;
        }

        let parent_user = &identity.credential.parent_user;
        let parent = if parent_user.is_empty() {
            None
        } else {
            let parent = self
                .iam
                .find_identity(parent_user)
                .map_err(ApiErrorCode::from)?;
            if !parent.credential.is_valid() {
                debug!(access_key, parent_user = %parent_user, "parent user disabled");
                return Err(ApiErrorCode::AccessKeyDisabled);
            }
            Some(parent)
        };
        Ok(Caller { identity, parent })
    }

    // ---------------------------------------------------------------------
    // Authorization
    // ---------------------------------------------------------------------

    /// Authenticate and authorize one S3 operation.
    #[must_use]
    pub fn authorize(&self, req: &AuthorizeRequest<'_>) -> Authorization {
        self.authorize_at(req, Utc::now())
    }

    /// [`Authorizer::authorize`] at a fixed instant.
    #[must_use]
    pub fn authorize_at(&self, req: &AuthorizeRequest<'_>, now: DateTime<Utc>) -> Authorization {
        let auth_type = classify_auth_type(req.parts);
        let authorization = self
            .authorize_as(req, auth_type, now)
            .unwrap_or_else(Authorization::unauthenticated);
        debug!(
            %auth_type,
            access_key = %authorization.access_key,
            action = %req.action,
            bucket = req.bucket,
            object = req.object,
            code = %authorization.code,
            "authorization decided"
        );
        authorization
    }

    fn authorize_as(
        &self,
        req: &AuthorizeRequest<'_>,
        auth_type: AuthType,
        now: DateTime<Utc>,
    ) -> Result<Authorization, ApiErrorCode> {
        match auth_type {
            AuthType::Unknown => return Err(ApiErrorCode::SignatureVersionNotSupported),
            AuthType::Streaming if !accepts_streaming(req.action) => {
                return Err(ApiErrorCode::SignatureVersionNotSupported);
            }
            AuthType::Anonymous => return self.authorize_anonymous(req, now),
            _ => {}
        }

        let verified = self.verify_as(auth_type, req.parts, req.payload_hash, ServiceType::S3, now)?;
        let caller = self.resolve_caller(&verified.access_key_id, auth_type, req.parts)?;
        let credential = &caller.policy_identity().credential;
        let account = credential.access_key.clone();
        let is_owner = self.iam.is_root(&account);

        let mut authorization = Authorization {
            credential: Some(credential.clone()),
            access_key: verified.access_key_id,
            is_owner,
            code: ApiErrorCode::None,
        };

        if req.action == S3Action::CreateBucket {
            let existing = self
                .iam
                .bucket_metadata(req.bucket)
                .map_err(ApiErrorCode::from)?;
            if existing.is_some_and(|meta| meta.owner != account) {
                authorization.code = ApiErrorCode::BucketAlreadyExists;
                return Ok(authorization);
            }
        }

        let principal_type = if caller.parent.is_some() {
            PrincipalType::AssumedRole
        } else if is_owner {
            PrincipalType::Account
        } else {
            PrincipalType::User
        };
        let conditions = build_condition_values(
            req.parts,
            &RequestIdentity {
                username: &account,
                user_id: &authorization.access_key,
                principal_type,
                signature_version: auth_type.signature_version(),
                auth_type: auth_type.condition_value(),
                now,
            },
        );
        let args = Args {
            account: &account,
            action: req.action,
            bucket: req.bucket,
            object: req.object,
            is_owner,
            conditions: &conditions,
        };

        let decision = self
            .iam_decision(&caller, &args)
            .map_err(ApiErrorCode::from)?;
        if !decision.is_allowed() {
            authorization.code = ApiErrorCode::AccessDenied;
        }
        Ok(authorization)
    }

    fn authorize_anonymous(
        &self,
        req: &AuthorizeRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<Authorization, ApiErrorCode> {
        if req.action == S3Action::ListAllMyBuckets || req.bucket.is_empty() {
            return Err(ApiErrorCode::AccessDenied);
        }
        let conditions = build_condition_values(
            req.parts,
            &RequestIdentity {
                username: "",
                user_id: "",
                principal_type: PrincipalType::Anonymous,
                signature_version: None,
                auth_type: None,
                now,
            },
        );
        let args = Args {
            account: "",
            action: req.action,
            bucket: req.bucket,
            object: req.object,
            is_owner: false,
            conditions: &conditions,
        };
        let decision = self
            .bucket_policy_decision(&args)
            .map_err(ApiErrorCode::from)?;
        if decision.is_allowed() {
            Ok(Authorization::unauthenticated(ApiErrorCode::None))
        } else {
            Err(ApiErrorCode::AccessDenied)
        }
    }

    /// Decide a signed request from the caller's IAM policies.
    pub(crate) fn iam_decision(&self, caller: &Caller, args: &Args<'_>) -> IamResult<PolicyDecision> {
        let policy = self.identity_policy(caller.policy_identity())?;
        let session_policy = caller.identity.session_policy.as_ref();
        let within_session = |args: &Args<'_>| {
            session_policy.is_none_or(|p| {
                p.is_allowed(&Args {
                    is_owner: false,
                    ..args.clone()
                })
            })
        };

        if with_list_fallback(args, |a| policy.is_allowed(a) && within_session(a)) {
            return Ok(PolicyDecision::Allowed);
        }

        if args.action.is_list_type() && !args.bucket.is_empty() {
            let decision = self.bucket_policy_decision(args)?;
            return Ok((decision.is_allowed() && within_session(args)).into());
        }

        debug!(account = args.account, action = %args.action, "denied by IAM policy");
        Ok(PolicyDecision::Denied)
    }

    /// Decide from the bucket policy alone; no policy denies.
    fn bucket_policy_decision(&self, args: &Args<'_>) -> IamResult<PolicyDecision> {
        let Some(policy) = self.iam.bucket_policy(args.bucket)? else {
            debug!(bucket = args.bucket, "no bucket policy");
            return Ok(PolicyDecision::Denied);
        };
        Ok(with_list_fallback(args, |a| policy.is_allowed(a)).into())
    }

    /// All user policies attached to `identity`, merged into one.
    fn identity_policy(&self, identity: &UserIdentity) -> IamResult<Policy> {
        let user = &identity.credential.access_key;
        let mut statements = Vec::new();
        for name in &identity.policies {
            statements.extend(self.iam.get_user_policy(user, name)?.statements);
        }
        Ok(Policy {
            id: None,
            version: DEFAULT_VERSION.to_owned(),
            statements,
        })
    }
}

/// Evaluate `allowed`, retrying `s3:ListBucketVersions` once as
/// `s3:ListBucket`.
fn with_list_fallback(args: &Args<'_>, allowed: impl Fn(&Args<'_>) -> bool) -> bool {
    allowed(args)
        || (args.action == S3Action::ListBucketVersions
            && allowed(&Args {
                action: S3Action::ListBucket,
                ..args.clone()
            }))
}

fn accepts_streaming(action: S3Action) -> bool {
    action == S3Action::PutObject
}

/// Session token sent with the request, header first.
fn session_token(parts: &http::request::Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(SECURITY_TOKEN_HEADER) {
        return value.to_str().ok().map(str::to_owned);
    }
    let query = parts.uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == SECURITY_TOKEN_QUERY)
        .map(|(_, value)| value.into_owned())
}

/// Temporary credentials need their exact session token; others must not
/// send one.
pub(crate) fn check_session_token(
    credential: &Credential,
    parts: &http::request::Parts,
) -> Result<(), ApiErrorCode> {
    let token = session_token(parts);
    if credential.is_temp() {
        let token = token.ok_or(ApiErrorCode::InvalidToken)?;
        if bool::from(token.as_bytes().ct_eq(credential.session_token.as_bytes())) {
            Ok(())
        } else {
            debug!(access_key = %credential.access_key, "session token mismatch");
            Err(ApiErrorCode::InvalidToken)
        }
    } else if token.is_some_and(|t| !t.is_empty()) {
        debug!(access_key = %credential.access_key, "session token on a long-lived key");
        Err(ApiErrorCode::InvalidToken)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use s3gate_core::MemoryStore;
    use s3gate_iam::BucketMetadata;

    use super::*;

    fn authorizer() -> Authorizer {
        Authorizer::from_config(Arc::new(MemoryStore::new()), GateConfig::default()).unwrap()
    }

    fn parts(uri: &str, headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn temp_credential() -> Credential {
        let mut cred = Credential::new("TEMPKEY", "tempsecret").unwrap();
        cred.session_token = "token-value".to_owned();
        cred.expiration = Some(Utc::now() + Duration::hours(1));
        cred
    }

    #[test]
    fn test_should_require_matching_session_token_for_temp_credentials() {
        let cred = temp_credential();
        let with_header = parts("http://localhost/b", &[(SECURITY_TOKEN_HEADER, "token-value")]);
        assert!(check_session_token(&cred, &with_header).is_ok());

        let with_query = parts("http://localhost/b?X-Amz-Security-Token=token-value", &[]);
        assert!(check_session_token(&cred, &with_query).is_ok());

        let wrong = parts("http://localhost/b", &[(SECURITY_TOKEN_HEADER, "other")]);
        assert_eq!(check_session_token(&cred, &wrong), Err(ApiErrorCode::InvalidToken));

        let missing = parts("http://localhost/b", &[]);
        assert_eq!(check_session_token(&cred, &missing), Err(ApiErrorCode::InvalidToken));
    }

    #[test]
    fn test_should_reject_session_token_on_long_lived_credentials() {
        let cred = Credential::new("alice", "alicesecret").unwrap();
        let with_token = parts("http://localhost/b", &[(SECURITY_TOKEN_HEADER, "x")]);
        assert_eq!(
            check_session_token(&cred, &with_token),
            Err(ApiErrorCode::InvalidToken)
        );
        assert!(check_session_token(&cred, &parts("http://localhost/b", &[])).is_ok());
    }

    #[test]
    fn test_should_deny_anonymous_without_bucket_policy() {
        let authz = authorizer();
        let p = parts("http://localhost/b/k", &[]);
        let result = authz.authorize(&AuthorizeRequest::new(&p, S3Action::GetObject, "b", "k"));
        assert_eq!(result.code, ApiErrorCode::AccessDenied);
        assert!(result.credential.is_none());

        let list = authz.authorize(&AuthorizeRequest::new(&p, S3Action::ListAllMyBuckets, "", ""));
        assert_eq!(list.code, ApiErrorCode::AccessDenied);
    }

    #[test]
    fn test_should_allow_anonymous_by_bucket_policy_with_list_fallback() {
        let authz = authorizer();
        let policy = Policy::parse(
            br#"{"Version": "2012-10-17", "Statement": [{"Effect": "Allow", "Principal": "*",
                 "Action": ["s3:GetObject", "s3:ListBucket"],
                 "Resource": ["arn:aws:s3:::public", "arn:aws:s3:::public/*"]}]}"#,
        )
        .unwrap();
        authz.iam().put_bucket_policy("public", &policy).unwrap();

        let p = parts("http://localhost/public/k", &[]);
        let get = authz.authorize(&AuthorizeRequest::new(&p, S3Action::GetObject, "public", "k"));
        assert!(get.is_allowed());
        assert!(!get.is_owner);

        let versions =
            authz.authorize(&AuthorizeRequest::new(&p, S3Action::ListBucketVersions, "public", ""));
        assert!(versions.is_allowed());

        let put = authz.authorize(&AuthorizeRequest::new(&p, S3Action::PutObject, "public", "k"));
        assert_eq!(put.into_result().unwrap_err(), ApiErrorCode::AccessDenied);
    }

    #[test]
    fn test_should_reject_unknown_auth_schemes() {
        let authz = authorizer();
        let p = parts("http://localhost/b/k", &[("authorization", "Digest abc")]);
        let result = authz.authorize(&AuthorizeRequest::new(&p, S3Action::GetObject, "b", "k"));
        assert_eq!(result.code, ApiErrorCode::SignatureVersionNotSupported);
    }

    #[test]
    fn test_should_merge_attached_user_policies() {
        let authz = authorizer();
        authz
            .iam()
            .add_user(Credential::new("alice", "alicesecret").unwrap())
            .unwrap();
        for (name, action) in [("get", "s3:GetObject"), ("put", "s3:PutObject")] {
            let doc = format!(
                r#"{{"Version": "2012-10-17", "Statement": [{{"Effect": "Allow",
                     "Action": "{action}", "Resource": "arn:aws:s3:::b/*"}}]}}"#
            );
            let policy = Policy::parse(doc.as_bytes()).unwrap();
            authz.iam().put_user_policy("alice", name, &policy).unwrap();
        }
        let identity = authz.iam().get_user("alice").unwrap();
        let merged = authz.identity_policy(&identity).unwrap();
        assert_eq!(merged.statements.len(), 2);
    }

    #[test]
    fn test_should_narrow_by_session_policy() {
        let authz = authorizer();
        let root = authz.iam().root().clone();
        let session = Policy::parse(
            br#"{"Version": "2012-10-17", "Statement": [{"Effect": "Allow",
                 "Action": "s3:GetObject", "Resource": "arn:aws:s3:::b/*"}]}"#,
        )
        .unwrap();
        let mut temp = UserIdentity::new(temp_credential());
        temp.credential.parent_user.clone_from(&root.access_key);
        temp.session_policy = Some(session);
        let caller = Caller {
            identity: temp,
            parent: Some(UserIdentity::new(root.clone())),
        };

        let conditions = std::collections::HashMap::new();
        let args = |action| Args {
            account: &root.access_key,
            action,
            bucket: "b",
            object: "k",
            is_owner: true,
            conditions: &conditions,
        };
        assert!(
            authz
                .iam_decision(&caller, &args(S3Action::GetObject))
                .unwrap()
                .is_allowed()
        );
        assert!(
            !authz
                .iam_decision(&caller, &args(S3Action::DeleteObject))
                .unwrap()
                .is_allowed()
        );
    }

    #[test]
    fn test_should_store_bucket_metadata_for_create_bucket_checks() {
        let authz = authorizer();
        authz
            .iam()
            .put_bucket_metadata(&BucketMetadata {
                name: "taken".to_owned(),
                owner: "someone".to_owned(),
                created: Utc::now(),
            })
            .unwrap();
        assert!(authz.iam().bucket_metadata("taken").unwrap().is_some());
    }
}
