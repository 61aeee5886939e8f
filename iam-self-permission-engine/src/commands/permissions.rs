use super::summary::{
    AccountSummary, AttachedPolicies, EffectivePermissionsSummary, IdentityPermissionsSummary,
    TrustPolicy,
};
use crate::collector::PolicyCollector;
use crate::error::{SelfPermissionError, SelfPermissionResult};
use crate::identity::{Identity, IdentityResolver, IdentityType};
use crate::policy::{EffectivePermissionAggregator, EffectivePermissions, KeyspaceMode};
use log::info;

impl super::service::SelfPermissionService {
    /// Names of the managed policies attached to the caller
    pub async fn attached_policies(&self) -> SelfPermissionResult<AttachedPolicies> {
        let identity = self.caller_identity().await?;
        if identity.identity_type == IdentityType::Other {
            return Ok(AttachedPolicies::NotApplicable {
                identity_type: identity.resource_type().to_string(),
            });
        }
        let names = PolicyCollector::new(self.iam.as_ref())
            .attached_policy_names(&identity)
            .await?;
        Ok(AttachedPolicies::Policies(names))
    }

    /// Effective permissions of the caller
    pub async fn effective_permissions(
        &self,
        mode: KeyspaceMode,
    ) -> SelfPermissionResult<EffectivePermissionsSummary> {
        let identity = self.caller_identity().await?;
        self.aggregate_for(&identity, mode)
            .await
            .map(EffectivePermissionsSummary)
    }

    /// Effective permissions of an arbitrary user, role or assumed-role ARN.
    ///
    /// The ARN is classified before any request is made.
    pub async fn effective_permissions_for(
        &self,
        arn: &str,
        mode: KeyspaceMode,
    ) -> SelfPermissionResult<IdentityPermissionsSummary> {
        let identity = IdentityResolver::classify(arn)?;
        let permissions = self.aggregate_for(&identity, mode).await?;
        Ok(IdentityPermissionsSummary {
            arn: identity.arn,
            permissions,
        })
    }

    /// Trust policy of the calling role
    pub async fn trust_policy(&self) -> SelfPermissionResult<TrustPolicy> {
        let identity = self.caller_identity().await?;
        match PolicyCollector::new(self.iam.as_ref())
            .trust_policy(&identity)
            .await
        {
            Ok(document) => Ok(TrustPolicy::Document(document)),
            Err(SelfPermissionError::NotApplicable { identity_type }) => {
                Ok(TrustPolicy::NotApplicable { identity_type })
            }
            Err(e) => Err(e),
        }
    }

    /// IAM entity usage and quotas for the account
    pub async fn account_summary(&self) -> SelfPermissionResult<AccountSummary> {
        Ok(AccountSummary(self.iam.get_account_summary().await?))
    }

    async fn aggregate_for(
        &self,
        identity: &Identity,
        mode: KeyspaceMode,
    ) -> SelfPermissionResult<EffectivePermissions> {
        let documents = PolicyCollector::new(self.iam.as_ref())
            .collect(identity)
            .await?;
        let permissions = EffectivePermissionAggregator::new(mode).aggregate(&documents);
        info!(
            "{} permission tokens across {} documents for {}",
            permissions.len(),
            documents.len(),
            identity.arn
        );
        Ok(permissions)
    }
}
