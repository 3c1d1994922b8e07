//! IAM records over the [`KvStore`] persistence seam.
//!
//! | Key | Value |
//! |-----|-------|
//! | `user/<accessKey>` | [`UserIdentity`] |
//! | `sts/<accessKey>` | [`UserIdentity`] of a temporary credential |
//! | `user_policy/<user>-<policy>` | [`Policy`] |
//! | `bucket_policy/<bucket>` | [`Policy`] |
//! | `buckets/-<bucket>` | [`BucketMetadata`] |

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3gate_auth::{AuthError, CredentialProvider};
use s3gate_core::{KvStore, StoreError};
use s3gate_policy::Policy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::credential::{AccountStatus, Credential, check_secret_key};
use crate::error::{IamError, IamResult};

fn user_key(access_key: &str) -> String {
    format!("user/{access_key}")
}

fn sts_key(access_key: &str) -> String {
    format!("sts/{access_key}")
}

fn user_policy_key(user: &str, policy: &str) -> String {
    format!("user_policy/{user}-{policy}")
}

/// The user part of a policy key may contain `-`, so names may not.
fn check_policy_name(name: &str) -> IamResult<()> {
    if name.is_empty() || name.contains(['-', '/']) {
        return Err(IamError::InvalidPolicyName(name.to_owned()));
    }
    Ok(())
}

fn bucket_policy_key(bucket: &str) -> String {
    format!("bucket_policy/{bucket}")
}

fn bucket_metadata_key(bucket: &str) -> String {
    format!("buckets/-{bucket}")
}

/// A stored credential plus what is attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// The credential.
    pub credential: Credential,
    /// Names of the user policies attached to this user.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub policies: BTreeSet<String>,
    /// Policy restricting a temporary credential below its parent's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_policy: Option<Policy>,
}

impl UserIdentity {
    /// Identity with no attached policies.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            policies: BTreeSet::new(),
            session_policy: None,
        }
    }
}

/// Ownership record of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMetadata {
    /// Bucket name.
    pub name: String,
    /// Access key of the owner.
    pub owner: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// IAM facade over a [`KvStore`].
///
/// The root credential is held in memory and never written to the store.
#[derive(Debug, Clone)]
pub struct IamStore {
    store: Arc<dyn KvStore>,
    root: Credential,
}

impl IamStore {
    /// Wrap `store`, with `root` as the owner account.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, root: Credential) -> Self {
        Self { store, root }
    }

    /// The root credential.
    #[must_use]
    pub fn root(&self) -> &Credential {
        &self.root
    }

    /// Whether `access_key` is the root account.
    #[must_use]
    pub fn is_root(&self, access_key: &str) -> bool {
        !access_key.is_empty() && access_key == self.root.access_key
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> IamResult<Option<T>> {
        match self.store.get(key) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => {
                error!(key, error = %e, "IAM store read failed");
                Err(e.into())
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> IamResult<()> {
        let bytes = Bytes::from(serde_json::to_vec(value)?);
        self.store.put(key, bytes).inspect_err(|e| {
            error!(key, error = %e, "IAM store write failed");
        })?;
        debug!(key, "IAM record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> IamResult<bool> {
        match self.store.delete(key) {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => {
                error!(key, error = %e, "IAM store delete failed");
                Err(e.into())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// Create or replace an IAM user, keeping attached policies.
    pub fn add_user(&self, credential: Credential) -> IamResult<()> {
        let key = user_key(&credential.access_key);
        let identity = match self.read::<UserIdentity>(&key)? {
            Some(existing) => UserIdentity {
                credential,
                ..existing
            },
            None => UserIdentity::new(credential),
        };
        self.write(&key, &identity)
    }

    /// Fetch an IAM user.
    pub fn get_user(&self, access_key: &str) -> IamResult<UserIdentity> {
        self.read(&user_key(access_key))?
            .ok_or_else(|| IamError::NoSuchUser(access_key.to_owned()))
    }

    /// Delete an IAM user and its attached policies.
    pub fn remove_user(&self, access_key: &str) -> IamResult<()> {
        let identity = self.get_user(access_key)?;
        for policy in &identity.policies {
            self.remove(&user_policy_key(access_key, policy))?;
        }
        self.remove(&user_key(access_key))?;
        debug!(access_key, "removed user");
        Ok(())
    }

    /// Enable or disable an IAM user.
    pub fn set_user_status(&self, access_key: &str, status: AccountStatus) -> IamResult<()> {
        let mut identity = self.get_user(access_key)?;
        identity.credential.status = status;
        self.write(&user_key(access_key), &identity)
    }

    /// Replace an IAM user's secret key.
    pub fn update_user_secret(&self, access_key: &str, secret_key: &str) -> IamResult<()> {
        check_secret_key(secret_key)?;
        let mut identity = self.get_user(access_key)?;
        secret_key.clone_into(&mut identity.credential.secret_key);
        self.write(&user_key(access_key), &identity)
    }

    // ---------------------------------------------------------------------
    // Temporary credentials
    // ---------------------------------------------------------------------

    /// Store a temporary credential. It is never deleted explicitly; it
    /// stops working when it expires.
    pub fn add_temp_user(&self, identity: &UserIdentity) -> IamResult<()> {
        self.write(&sts_key(&identity.credential.access_key), identity)
    }

    /// Fetch a temporary credential.
    pub fn get_temp_user(&self, access_key: &str) -> IamResult<UserIdentity> {
        self.read(&sts_key(access_key))?
            .ok_or_else(|| IamError::NoSuchUser(access_key.to_owned()))
    }

    /// Resolve any access key: root, IAM user, then temporary credential.
    pub fn find_identity(&self, access_key: &str) -> IamResult<UserIdentity> {
        if self.is_root(access_key) {
            return Ok(UserIdentity::new(self.root.clone()));
        }
        if let Some(identity) = self.read(&user_key(access_key))? {
            return Ok(identity);
        }
        self.get_temp_user(access_key)
    }

    // ---------------------------------------------------------------------
    // User policies
    // ---------------------------------------------------------------------

    /// Attach `policy` to `user` under `name`, replacing any policy of that
    /// name.
    pub fn put_user_policy(&self, user: &str, name: &str, policy: &Policy) -> IamResult<()> {
        check_policy_name(name)?;
        policy.is_valid()?;
        let mut identity = self.get_user(user)?;
        self.write(&user_policy_key(user, name), policy)?;
        if identity.policies.insert(name.to_owned()) {
            self.write(&user_key(user), &identity)?;
        }
        Ok(())
    }

    /// Fetch the policy attached to `user` under `name`.
    pub fn get_user_policy(&self, user: &str, name: &str) -> IamResult<Policy> {
        self.read(&user_policy_key(user, name))?
            .ok_or_else(|| IamError::NoSuchUserPolicy {
                user: user.to_owned(),
                policy: name.to_owned(),
            })
    }

    /// Detach and delete the policy `name` from `user`.
    pub fn delete_user_policy(&self, user: &str, name: &str) -> IamResult<()> {
        let mut identity = self.get_user(user)?;
        let attached = identity.policies.remove(name);
        let existed = self.remove(&user_policy_key(user, name))?;
        if !attached && !existed {
            return Err(IamError::NoSuchUserPolicy {
                user: user.to_owned(),
                policy: name.to_owned(),
            });
        }
        self.write(&user_key(user), &identity)
    }

    /// Every policy attached to `user`.
    pub fn user_policies(&self, user: &str) -> IamResult<Vec<Policy>> {
        let identity = self.get_user(user)?;
        identity
            .policies
            .iter()
            .map(|name| self.get_user_policy(user, name))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Buckets
    // ---------------------------------------------------------------------

    /// Validate `policy` against `bucket` and store it.
    pub fn put_bucket_policy(&self, bucket: &str, policy: &Policy) -> IamResult<()> {
        policy.validate_for_bucket(bucket)?;
        self.write(&bucket_policy_key(bucket), policy)
    }

    /// The bucket's policy, if any.
    pub fn bucket_policy(&self, bucket: &str) -> IamResult<Option<Policy>> {
        self.read(&bucket_policy_key(bucket))
    }

    /// The bucket's policy.
    pub fn get_bucket_policy(&self, bucket: &str) -> IamResult<Policy> {
        self.bucket_policy(bucket)?
            .ok_or_else(|| IamError::NoSuchBucketPolicy(bucket.to_owned()))
    }

    /// Delete the bucket's policy.
    pub fn delete_bucket_policy(&self, bucket: &str) -> IamResult<()> {
        if self.remove(&bucket_policy_key(bucket))? {
            Ok(())
        } else {
            Err(IamError::NoSuchBucketPolicy(bucket.to_owned()))
        }
    }

    /// Record bucket ownership.
    pub fn put_bucket_metadata(&self, metadata: &BucketMetadata) -> IamResult<()> {
        self.write(&bucket_metadata_key(&metadata.name), metadata)
    }

    /// Ownership record of `bucket`, if it exists.
    pub fn bucket_metadata(&self, bucket: &str) -> IamResult<Option<BucketMetadata>> {
        self.read(&bucket_metadata_key(bucket))
    }
}

impl CredentialProvider for IamStore {
    fn get_secret_key(&self, access_key: &str) -> Result<String, AuthError> {
        let identity = match self.find_identity(access_key) {
            Ok(identity) => identity,
            Err(IamError::NoSuchUser(_)) => {
                return Err(AuthError::AccessKeyNotFound(access_key.to_owned()));
            }
            Err(e) => return Err(AuthError::Internal(e.to_string())),
        };
        if !identity.credential.is_valid() {
            debug!(access_key, "credential disabled or expired");
            return Err(AuthError::AccessKeyDisabled(access_key.to_owned()));
        }
        Ok(identity.credential.secret_key)
    }
}
