//! Natural-language summaries produced by the service operations

use crate::aws::sts::CallerIdentity;
use crate::policy::EffectivePermissions;
use crate::render::{fenced_json, pretty_json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

fn write_json<T: Serialize + ?Sized>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    value: &T,
) -> fmt::Result {
    let json = pretty_json(value).map_err(|_| fmt::Error)?;
    write!(f, "{title}\n{}", fenced_json(&json))
}

/// The caller's user name, or the role ARN when the caller is not a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityName {
    User(String),
    NotAUser { arn: String },
}

impl fmt::Display for IdentityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => write!(f, "The username is {name}."),
            Self::NotAUser { arn } => {
                write!(f, "I don't have a username, I am using an IAM role: {arn}.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The AWS account ID is: {}.", self.0)
    }
}

/// ARN resource type of the caller (`user`, `role`, `assumed-role`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKind(pub String);

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The current identity is {}.", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerDetails(pub CallerIdentity);

impl fmt::Display for CallerDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, "Here are the Caller Identity Info:", &self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachedPolicies {
    Policies(Vec<String>),
    NotApplicable { identity_type: String },
}

impl fmt::Display for AttachedPolicies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policies(names) => write!(f, "The attached policies are: {}.", names.join(", ")),
            Self::NotApplicable { identity_type } => write!(
                f,
                "Permissions are not applicable for identity type: {identity_type}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMembership {
    Groups(Vec<String>),
    NotAUser,
}

impl fmt::Display for GroupMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groups(groups) => write!(
                f,
                "The current IAM user belongs to the following groups: {}.",
                groups.join(",")
            ),
            Self::NotAUser => write!(f, "Roles do not belong to IAM groups."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaStatus {
    Enabled,
    Disabled,
    NotAUser,
}

impl fmt::Display for MfaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "MFA is enabled."),
            Self::Disabled => write!(f, "MFA is not enabled."),
            Self::NotAUser => write!(f, "MFA is applicable only for IAM users."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    Document(serde_json::Value),
    NotApplicable { identity_type: String },
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(document) => write_json(
                f,
                "The trust policies for the current IAM identity are:",
                document,
            ),
            Self::NotApplicable { identity_type } => write!(
                f,
                "Trust policy is not applicable for identity type: {identity_type}"
            ),
        }
    }
}

/// IAM usage statistics, keyed by summary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary(pub BTreeMap<String, i32>);

impl fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, "The account summary is:", &self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissionsSummary(pub EffectivePermissions);

impl fmt::Display for EffectivePermissionsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(
            f,
            "The effective permissions for the current IAM identity are:",
            &self.0,
        )
    }
}

/// Effective permissions of an identity named by ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPermissionsSummary {
    pub arn: String,
    pub permissions: EffectivePermissions,
}

impl fmt::Display for IdentityPermissionsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(
            f,
            &format!("The effective permissions for {} are:", self.arn),
            &self.permissions,
        )
    }
}
