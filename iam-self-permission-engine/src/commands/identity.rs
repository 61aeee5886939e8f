use super::summary::{
    AccountId, CallerDetails, GroupMembership, IdentityKind, IdentityName, MfaStatus,
};
use crate::error::SelfPermissionResult;
use crate::identity::IdentityType;
use log::debug;

impl super::service::SelfPermissionService {
    /// Name of the calling user, or the ARN when the caller is not a user
    pub async fn identity_name(&self) -> SelfPermissionResult<IdentityName> {
        let identity = self.caller_identity().await?;
        Ok(match identity.identity_type {
            IdentityType::User => IdentityName::User(identity.name),
            _ => IdentityName::NotAUser { arn: identity.arn },
        })
    }

    pub async fn account_id(&self) -> SelfPermissionResult<AccountId> {
        Ok(AccountId(self.caller().await?.account))
    }

    /// The raw "who am I" response
    pub async fn caller_details(&self) -> SelfPermissionResult<CallerDetails> {
        Ok(CallerDetails(self.caller().await?))
    }

    /// ARN resource type of the caller, e.g. `assumed-role`
    pub async fn identity_type(&self) -> SelfPermissionResult<IdentityKind> {
        let identity = self.caller_identity().await?;
        Ok(IdentityKind(identity.resource_type().to_string()))
    }

    /// Groups the calling user belongs to. Roles have none.
    pub async fn groups(&self) -> SelfPermissionResult<GroupMembership> {
        let identity = self.caller_identity().await?;
        if identity.identity_type != IdentityType::User {
            return Ok(GroupMembership::NotAUser);
        }
        let groups = self.iam.list_groups_for_user(&identity.name).await?;
        debug!("{} belongs to {} groups", identity.name, groups.len());
        Ok(GroupMembership::Groups(groups))
    }

    /// Whether the calling user has at least one MFA device
    pub async fn mfa_status(&self) -> SelfPermissionResult<MfaStatus> {
        let identity = self.caller_identity().await?;
        if identity.identity_type != IdentityType::User {
            return Ok(MfaStatus::NotAUser);
        }
        let devices = self.iam.list_mfa_devices(&identity.name).await?;
        Ok(if devices.is_empty() {
            MfaStatus::Disabled
        } else {
            MfaStatus::Enabled
        })
    }
}
