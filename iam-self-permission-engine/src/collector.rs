//! Policy collection for a classified identity
//!
//! Collects inline policies by name and attached managed policies through their
//! current default version. Any failed fetch aborts the whole collection; partial
//! results are never returned.

use crate::aws::iam_client::IamApi;
use crate::error::{SelfPermissionError, SelfPermissionResult};
use crate::identity::{Identity, IdentityType, PrincipalKind};
use crate::policy::{
    decode_policy_value, PolicyDocument, PolicyDocumentJson, PolicySource, StatementNormalizer,
};
use log::{debug, info, trace};

pub struct PolicyCollector<'a> {
    iam: &'a dyn IamApi,
}

impl<'a> PolicyCollector<'a> {
    pub fn new(iam: &'a dyn IamApi) -> Self {
        Self { iam }
    }

    /// Fetch and normalize every inline and attached policy of the identity.
    ///
    /// Documents are returned inline first, then attached, each in the order
    /// IAM lists them. Group policies are not collected.
    pub async fn collect(&self, identity: &Identity) -> SelfPermissionResult<Vec<PolicyDocument>> {
        let (kind, principal_name) = principal_of(identity)?;

        let inline_names = self
            .iam
            .list_inline_policies(kind, principal_name)
            .await
            .map_err(|e| {
                SelfPermissionError::policy_fetch(
                    format!("inline policy list of {kind} {principal_name}"),
                    e,
                )
            })?;
        let attached = self.list_attached(kind, principal_name).await?;
        debug!(
            "{} {principal_name}: {} inline and {} attached policies",
            kind,
            inline_names.len(),
            attached.len()
        );

        let mut documents = Vec::with_capacity(inline_names.len() + attached.len());
        for policy_name in inline_names {
            trace!("Collecting inline policy {policy_name}");
            let document = self
                .iam
                .get_inline_policy(kind, principal_name, &policy_name)
                .await
                .and_then(|raw| PolicyDocumentJson::decode(&raw))
                .map_err(|e| SelfPermissionError::policy_fetch(&policy_name, e))?;
            documents.push(StatementNormalizer::normalize_document(
                policy_name,
                PolicySource::Inline,
                &document,
            ));
        }

        for policy in attached {
            trace!("Collecting managed policy {} ({})", policy.name, policy.arn);
            let document = self
                .iam
                .get_default_policy_version(&policy.arn)
                .await
                .and_then(|raw| PolicyDocumentJson::decode(&raw))
                .map_err(|e| SelfPermissionError::policy_fetch(&policy.name, e))?;
            documents.push(StatementNormalizer::normalize_document(
                policy.name,
                PolicySource::Managed { arn: policy.arn },
                &document,
            ));
        }

        info!(
            "Collected {} policy documents for {}",
            documents.len(),
            identity.arn
        );
        Ok(documents)
    }

    /// Names of the managed policies attached to the identity
    pub async fn attached_policy_names(
        &self,
        identity: &Identity,
    ) -> SelfPermissionResult<Vec<String>> {
        let (kind, principal_name) = principal_of(identity)?;
        Ok(self
            .list_attached(kind, principal_name)
            .await?
            .into_iter()
            .map(|policy| policy.name)
            .collect())
    }

    /// The trust policy of a role or assumed role, as untyped JSON.
    ///
    /// Only fetched on request and never part of the effective permissions.
    pub async fn trust_policy(&self, identity: &Identity) -> SelfPermissionResult<serde_json::Value> {
        if !matches!(
            identity.identity_type,
            IdentityType::Role | IdentityType::AssumedRole
        ) {
            return Err(SelfPermissionError::NotApplicable {
                identity_type: identity.resource_type().to_string(),
            });
        }
        let label = format!("trust policy of role {}", identity.name);
        self.iam
            .get_role_trust_policy(&identity.name)
            .await
            .and_then(|raw| decode_policy_value(&raw))
            .map_err(|e| SelfPermissionError::policy_fetch(label, e))
    }

    async fn list_attached(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> SelfPermissionResult<Vec<crate::aws::iam_client::AttachedPolicy>> {
        self.iam
            .list_attached_policies(kind, principal_name)
            .await
            .map_err(|e| {
                SelfPermissionError::policy_fetch(
                    format!("attached policy list of {kind} {principal_name}"),
                    e,
                )
            })
    }
}

fn principal_of(identity: &Identity) -> SelfPermissionResult<(PrincipalKind, &str)> {
    identity
        .principal()
        .ok_or_else(|| SelfPermissionError::NotApplicable {
            identity_type: identity.resource_type().to_string(),
        })
}
