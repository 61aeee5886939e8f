//! Identity classification from ARN strings.
//!
//! Two shapes are accepted:
//! - `arn:<partition>:iam::<account>:user/[<path>/]<name>` classifies as a user.
//! - `arn:<partition>:(iam|sts)::<account>:(role|assumed-role)/...` classifies as a role
//!   or an assumed role.
//!
//! An assumed-role ARN ends with the session name; the role name is the segment
//! before it.

use crate::error::{SelfPermissionError, SelfPermissionResult};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Kind of identity, derived from the ARN resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentityType {
    User,
    Role,
    AssumedRole,
    Other,
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Role => write!(f, "Role"),
            Self::AssumedRole => write!(f, "AssumedRole"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// The IAM principal an identity's policies are attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    User,
    Role,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Role => write!(f, "role"),
        }
    }
}

/// A classified identity. Pure function of the ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Identity {
    pub arn: String,
    #[serde(rename = "Type")]
    pub identity_type: IdentityType,
    pub name: String,
}

impl Identity {
    /// The principal whose inline and attached policies apply to this identity.
    ///
    /// Assumed roles resolve to their underlying role.
    pub fn principal(&self) -> Option<(PrincipalKind, &str)> {
        match self.identity_type {
            IdentityType::User => Some((PrincipalKind::User, &self.name)),
            IdentityType::Role | IdentityType::AssumedRole => {
                Some((PrincipalKind::Role, &self.name))
            }
            IdentityType::Other => None,
        }
    }

    /// The ARN resource type token, e.g. `user`, `assumed-role` or `root`
    pub fn resource_type(&self) -> &str {
        self.arn
            .splitn(6, ':')
            .nth(5)
            .and_then(|resource| resource.split('/').next())
            .unwrap_or("unknown")
    }

    pub fn partition(&self) -> Option<&str> {
        self.arn.split(':').nth(1).filter(|p| !p.is_empty())
    }

    pub fn account_id(&self) -> Option<String> {
        extract_account_from_arn(&self.arn)
    }

    /// ARN usable as a policy simulation source.
    ///
    /// Simulation does not accept session ARNs, so an assumed role maps back to
    /// `arn:<partition>:iam::<account>:role/<name>`.
    pub fn simulation_arn(&self) -> Option<String> {
        match self.identity_type {
            IdentityType::User | IdentityType::Role => Some(self.arn.clone()),
            IdentityType::AssumedRole => Some(format!(
                "arn:{}:iam::{}:role/{}",
                self.partition()?,
                self.account_id()?,
                self.name
            )),
            IdentityType::Other => None,
        }
    }
}

/// Extract 12-digit account ID from ARN (field 5 in colon-delimited format)
pub fn extract_account_from_arn(arn: &str) -> Option<String> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() >= 6 {
        let account_id = parts[4];
        if account_id.len() == 12 && account_id.chars().all(|c| c.is_ascii_digit()) {
            return Some(account_id.to_string());
        }
    }
    None
}

const NAME_CHARS: &str = r"[\w+=,.@-]+";

fn user_arn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(
            r"^arn:aws[a-z-]*:iam::\d{{12}}:user/(?:{NAME_CHARS}/)*(?P<name>{NAME_CHARS})$"
        ))
        .expect("user ARN pattern is valid")
    })
}

fn role_arn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(
            r"^arn:aws[a-z-]*:(?:iam|sts)::\d{{12}}:(?P<kind>role|assumed-role)/(?P<path>{NAME_CHARS}(?:/{NAME_CHARS})*)$"
        ))
        .expect("role ARN pattern is valid")
    })
}

fn generic_arn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^arn:aws[a-z-]*:(?:iam|sts)::\d{12}:(?P<resource>[^/\s]+)(?:/(?P<rest>\S*))?$")
            .expect("generic ARN pattern is valid")
    })
}

/// Classifies ARN strings into identities
pub struct IdentityResolver;

impl IdentityResolver {
    /// Strictly classify an ARN as a user, role or assumed role.
    ///
    /// Anything else fails with [`SelfPermissionError::InvalidIdentityFormat`].
    pub fn classify(arn: &str) -> SelfPermissionResult<Identity> {
        let invalid = || SelfPermissionError::InvalidIdentityFormat(arn.to_string());

        if let Some(captures) = user_arn_pattern().captures(arn) {
            return Ok(Identity {
                arn: arn.to_string(),
                identity_type: IdentityType::User,
                name: captures["name"].to_string(),
            });
        }

        let captures = role_arn_pattern().captures(arn).ok_or_else(invalid)?;
        let segments: Vec<&str> = captures["path"].split('/').collect();
        let (identity_type, name) = match &captures["kind"] {
            // Role paths are allowed; the name is always the final segment.
            "role" => (IdentityType::Role, segments.last().copied()),
            // <role>/<session>: the role name precedes the session name.
            _ => match segments.as_slice() {
                [role] | [role, _] => (IdentityType::AssumedRole, Some(*role)),
                _ => return Err(invalid()),
            },
        };

        Ok(Identity {
            arn: arn.to_string(),
            identity_type,
            name: name.ok_or_else(invalid)?.to_string(),
        })
    }

    /// Classify the caller's own ARN, mapping well-formed IAM/STS ARNs of other
    /// resource types (such as `root` or `federated-user/...`) to [`IdentityType::Other`].
    pub fn describe(arn: &str) -> SelfPermissionResult<Identity> {
        match Self::classify(arn) {
            Ok(identity) => Ok(identity),
            Err(err) => {
                let captures = generic_arn_pattern().captures(arn).ok_or(err)?;
                let name = captures
                    .name("rest")
                    .and_then(|rest| rest.as_str().rsplit('/').next())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&captures["resource"]);
                Ok(Identity {
                    arn: arn.to_string(),
                    identity_type: IdentityType::Other,
                    name: name.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("arn:aws:iam::123456789012:role/Deploy", IdentityType::Role, "Deploy")]
    #[case(
        "arn:aws:iam::123456789012:assumed-role/Deploy/session1",
        IdentityType::AssumedRole,
        "Deploy"
    )]
    #[case(
        "arn:aws:sts::123456789012:assumed-role/Deploy/jdoe@example.com",
        IdentityType::AssumedRole,
        "Deploy"
    )]
    #[case("arn:aws:iam::123456789012:user/jdoe", IdentityType::User, "jdoe")]
    #[case(
        "arn:aws:iam::123456789012:user/division/team/jdoe",
        IdentityType::User,
        "jdoe"
    )]
    #[case(
        "arn:aws:iam::123456789012:role/service-role/LambdaExec",
        IdentityType::Role,
        "LambdaExec"
    )]
    #[case(
        "arn:aws-cn:iam::680431765560:user/auser",
        IdentityType::User,
        "auser"
    )]
    #[case(
        "arn:aws-us-gov:iam::123456789012:assumed-role/Admin",
        IdentityType::AssumedRole,
        "Admin"
    )]
    fn test_classify(
        #[case] arn: &str,
        #[case] identity_type: IdentityType,
        #[case] name: &str,
    ) {
        let identity = IdentityResolver::classify(arn).unwrap();
        assert_eq!(identity.identity_type, identity_type);
        assert_eq!(identity.name, name);
        assert_eq!(identity.arn, arn);
    }

    #[rstest]
    #[case("")]
    #[case("not-an-arn")]
    #[case("arn:aws:iam::123456789012:root")]
    #[case("arn:aws:iam::123456789012:group/Admins")]
    #[case("arn:aws:sts::123456789012:federated-user/bob")]
    #[case("arn:aws:iam::12345:user/jdoe")]
    #[case("arn:aws:iam::123456789012:user/")]
    #[case("arn:aws:iam::123456789012:user/j doe")]
    #[case("arn:aws:iam::123456789012:assumed-role/Deploy/session1/extra")]
    #[case("arn:aws:s3:::my-bucket")]
    fn test_classify_rejects(#[case] arn: &str) {
        match IdentityResolver::classify(arn) {
            Err(SelfPermissionError::InvalidIdentityFormat(rejected)) => {
                assert_eq!(rejected, arn)
            }
            other => panic!("Expected InvalidIdentityFormat for {arn:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let arn = "arn:aws:iam::123456789012:assumed-role/Deploy/session1";
        assert_eq!(
            IdentityResolver::classify(arn).unwrap(),
            IdentityResolver::classify(arn).unwrap()
        );
    }

    #[test]
    fn test_describe_other_identities() {
        let root = IdentityResolver::describe("arn:aws:iam::123456789012:root").unwrap();
        assert_eq!(root.identity_type, IdentityType::Other);
        assert_eq!(root.resource_type(), "root");
        assert_eq!(root.name, "root");
        assert!(root.principal().is_none());

        let federated =
            IdentityResolver::describe("arn:aws:sts::123456789012:federated-user/bob").unwrap();
        assert_eq!(federated.identity_type, IdentityType::Other);
        assert_eq!(federated.resource_type(), "federated-user");
        assert_eq!(federated.name, "bob");

        assert!(IdentityResolver::describe("garbage").is_err());
    }

    #[test]
    fn test_principal_and_simulation_arn() {
        let assumed =
            IdentityResolver::classify("arn:aws:sts::123456789012:assumed-role/Deploy/s1")
                .unwrap();
        assert_eq!(assumed.principal(), Some((PrincipalKind::Role, "Deploy")));
        assert_eq!(assumed.resource_type(), "assumed-role");
        assert_eq!(
            assumed.simulation_arn().as_deref(),
            Some("arn:aws:iam::123456789012:role/Deploy")
        );

        let user = IdentityResolver::classify("arn:aws:iam::123456789012:user/jdoe").unwrap();
        assert_eq!(user.principal(), Some((PrincipalKind::User, "jdoe")));
        assert_eq!(user.simulation_arn().as_deref(), Some(user.arn.as_str()));
    }

    #[test]
    fn test_extract_account_from_arn() {
        assert_eq!(
            extract_account_from_arn("arn:aws:iam::123456789012:role/MyRole"),
            Some("123456789012".to_string())
        );
        assert_eq!(extract_account_from_arn("not-an-arn"), None);
        assert_eq!(extract_account_from_arn("arn:aws:iam::::"), None);
        assert_eq!(
            extract_account_from_arn("arn:aws:iam::12345678901a:role/MyRole"),
            None
        );
        assert_eq!(
            extract_account_from_arn("arn:aws:iam::1234567890123:role/MyRole"),
            None
        );
    }
}
