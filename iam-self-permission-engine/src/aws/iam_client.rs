//! AWS IAM client wrapper for read-only policy and identity lookups
//!
//! Policy documents are returned exactly as IAM hands them out (usually
//! URL-encoded JSON); decoding is left to [`crate::policy::PolicyDocumentJson`].

use crate::aws::{AwsError, AwsResult};
use crate::identity::PrincipalKind;
use async_trait::async_trait;
use aws_sdk_iam::Client as IamClient;
use log::trace;
use std::collections::BTreeMap;

/// A managed policy attached to a user or role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedPolicy {
    pub name: String,
    pub arn: String,
}

/// The IAM read operations the engine consumes
#[async_trait]
pub trait IamApi: Send + Sync {
    /// List all inline policy names for a principal
    async fn list_inline_policies(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> AwsResult<Vec<String>>;

    /// Fetch a specific inline policy document
    async fn get_inline_policy(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
        policy_name: &str,
    ) -> AwsResult<String>;

    /// List managed policies attached to a principal
    async fn list_attached_policies(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> AwsResult<Vec<AttachedPolicy>>;

    /// Fetch the document of a managed policy's current default version
    async fn get_default_policy_version(&self, policy_arn: &str) -> AwsResult<String>;

    /// Fetch a role's trust (assume-role) policy document
    async fn get_role_trust_policy(&self, role_name: &str) -> AwsResult<String>;

    async fn list_groups_for_user(&self, user_name: &str) -> AwsResult<Vec<String>>;

    /// Serial numbers of the MFA devices registered for a user
    async fn list_mfa_devices(&self, user_name: &str) -> AwsResult<Vec<String>>;

    async fn get_account_summary(&self) -> AwsResult<BTreeMap<String, i32>>;
}

pub struct AwsIamClient {
    client: IamClient,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IamApi for AwsIamClient {
    async fn list_inline_policies(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> AwsResult<Vec<String>> {
        match kind {
            PrincipalKind::Role => self
                .client
                .list_role_policies()
                .role_name(principal_name)
                .into_paginator()
                .items()
                .send()
                .try_collect()
                .await
                .map_err(|e| AwsError::IamError(format!("Failed to list role policies: {e}"))),
            PrincipalKind::User => self
                .client
                .list_user_policies()
                .user_name(principal_name)
                .into_paginator()
                .items()
                .send()
                .try_collect()
                .await
                .map_err(|e| AwsError::IamError(format!("Failed to list user policies: {e}"))),
        }
    }

    async fn get_inline_policy(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
        policy_name: &str,
    ) -> AwsResult<String> {
        trace!("Fetching inline policy '{policy_name}' of {kind} '{principal_name}'");
        match kind {
            PrincipalKind::Role => {
                let response = self
                    .client
                    .get_role_policy()
                    .role_name(principal_name)
                    .policy_name(policy_name)
                    .send()
                    .await
                    .map_err(|e| {
                        AwsError::IamError(format!(
                            "Failed to get role policy '{policy_name}' on role '{principal_name}': {e}"
                        ))
                    })?;
                Ok(response.policy_document)
            }
            PrincipalKind::User => {
                let response = self
                    .client
                    .get_user_policy()
                    .user_name(principal_name)
                    .policy_name(policy_name)
                    .send()
                    .await
                    .map_err(|e| {
                        AwsError::IamError(format!(
                            "Failed to get user policy '{policy_name}' on user '{principal_name}': {e}"
                        ))
                    })?;
                Ok(response.policy_document)
            }
        }
    }

    async fn list_attached_policies(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> AwsResult<Vec<AttachedPolicy>> {
        let attached = match kind {
            PrincipalKind::Role => self
                .client
                .list_attached_role_policies()
                .role_name(principal_name)
                .into_paginator()
                .items()
                .send()
                .try_collect()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!("Failed to list attached role policies: {e}"))
                })?,
            PrincipalKind::User => self
                .client
                .list_attached_user_policies()
                .user_name(principal_name)
                .into_paginator()
                .items()
                .send()
                .try_collect()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!("Failed to list attached user policies: {e}"))
                })?,
        };

        attached
            .into_iter()
            .map(|policy| match (policy.policy_name(), policy.policy_arn()) {
                (Some(name), Some(arn)) => Ok(AttachedPolicy {
                    name: name.to_string(),
                    arn: arn.to_string(),
                }),
                _ => Err(AwsError::IamError(format!(
                    "Attached policy without name or ARN: {policy:?}"
                ))),
            })
            .collect()
    }

    async fn get_default_policy_version(&self, policy_arn: &str) -> AwsResult<String> {
        let policy = self
            .client
            .get_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to get policy '{policy_arn}': {e}")))?;
        let version_id = policy
            .policy()
            .and_then(|p| p.default_version_id())
            .ok_or_else(|| {
                AwsError::IamError(format!("Policy '{policy_arn}' has no default version"))
            })?;
        trace!("Resolved '{policy_arn}' to default version {version_id}");

        let version = self
            .client
            .get_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to get version {version_id} of policy '{policy_arn}': {e}"
                ))
            })?;
        version
            .policy_version()
            .and_then(|v| v.document())
            .map(str::to_string)
            .ok_or_else(|| {
                AwsError::PolicyError(format!(
                    "Version {version_id} of policy '{policy_arn}' has no document"
                ))
            })
    }

    async fn get_role_trust_policy(&self, role_name: &str) -> AwsResult<String> {
        let response = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to get role '{role_name}': {e}")))?;
        response
            .role()
            .and_then(|role| role.assume_role_policy_document())
            .map(str::to_string)
            .ok_or_else(|| {
                AwsError::PolicyError(format!("Role '{role_name}' has no trust policy document"))
            })
    }

    async fn list_groups_for_user(&self, user_name: &str) -> AwsResult<Vec<String>> {
        let groups = self
            .client
            .list_groups_for_user()
            .user_name(user_name)
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to list groups for user: {e}")))?;
        Ok(groups
            .iter()
            .map(|group| group.group_name().to_string())
            .collect())
    }

    async fn list_mfa_devices(&self, user_name: &str) -> AwsResult<Vec<String>> {
        let devices = self
            .client
            .list_mfa_devices()
            .user_name(user_name)
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to list MFA devices: {e}")))?;
        Ok(devices
            .iter()
            .map(|device| device.serial_number().to_string())
            .collect())
    }

    async fn get_account_summary(&self) -> AwsResult<BTreeMap<String, i32>> {
        let response = self
            .client
            .get_account_summary()
            .send()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to get account summary: {e}")))?;
        Ok(response
            .summary_map()
            .map(|summary| {
                summary
                    .iter()
                    .map(|(key, value)| (key.as_str().to_string(), *value))
                    .collect()
            })
            .unwrap_or_default())
    }
}
