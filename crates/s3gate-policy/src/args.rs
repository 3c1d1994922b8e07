use std::collections::HashMap;

use crate::action::S3Action;

/// Everything a policy needs to decide one request.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    /// Access key (or parent user) the request acts as; empty when anonymous.
    pub account: &'a str,
    /// Requested operation.
    pub action: S3Action,
    /// Target bucket; empty for service-level operations.
    pub bucket: &'a str,
    /// Target object key; empty for bucket-level operations.
    pub object: &'a str,
    /// Owners bypass every allow check, but not explicit denies.
    pub is_owner: bool,
    /// Condition context from
    /// [`build_condition_values`](crate::build_condition_values).
    pub conditions: &'a HashMap<String, Vec<String>>,
}

impl Args<'_> {
    /// `bucket/object`, or `bucket/` for bucket-level operations.
    #[must_use]
    pub fn resource_path(&self) -> String {
        let mut resource = String::with_capacity(self.bucket.len() + self.object.len() + 1);
        resource.push_str(self.bucket);
        if self.object.is_empty() {
            resource.push('/');
        } else {
            if !self.object.starts_with('/') {
                resource.push('/');
            }
            resource.push_str(self.object);
        }
        resource
    }
}
