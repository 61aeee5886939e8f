//! Credential settings and their structural validation.
//!
//! Validation here is pure: it checks region membership, key lengths and the
//! credential strategy without touching the network. Resolving the caller
//! identity is a separate step, see [`crate::aws::session::CredentialResolver`].

mod regions;

pub use regions::{is_published_region, PUBLISHED_REGIONS};

use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Exact length of an AWS access key id
pub const ACCESS_KEY_ID_LEN: usize = 20;
/// Exact length of an AWS secret access key
pub const SECRET_ACCESS_KEY_LEN: usize = 40;
/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{0} is not a valid AWS region")]
    InvalidRegion(String),
    #[error("Enable the IAM role or provide a credentials profile name or both access key id and secret access key")]
    MissingCredentials,
    #[error(
        "The access key id must be {} characters and the secret access key {} characters",
        ACCESS_KEY_ID_LEN,
        SECRET_ACCESS_KEY_LEN
    )]
    InvalidKeyFormat,
    #[error("Invalid endpoint override '{0}'")]
    InvalidEndpoint(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Raw credential settings as supplied by the caller.
///
/// Empty or whitespace-only strings are treated as absent.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct CredentialSpec {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub profile_name: Option<String>,
    pub machine_role_assigned: bool,
    pub region: String,
    pub endpoint_override: Option<String>,
}

impl Default for CredentialSpec {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            profile_name: None,
            machine_role_assigned: false,
            region: DEFAULT_REGION.to_string(),
            endpoint_override: None,
        }
    }
}

impl fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSpec")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(self.secret_access_key.as_ref()))
            .field("session_token", &redacted(self.session_token.as_ref()))
            .field("profile_name", &self.profile_name)
            .field("machine_role_assigned", &self.machine_role_assigned)
            .field("region", &self.region)
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}

fn redacted(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "** redacted **")
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Static key pair with an optional session token
#[derive(Clone, PartialEq, Eq)]
pub struct StaticKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for StaticKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeys")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &redacted(self.session_token.as_ref()))
            .finish()
    }
}

/// The single credential path a configuration resolves through.
///
/// Precedence: machine role > named profile > explicit keys > ambient default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    MachineRole,
    Profile(String),
    StaticKeys(StaticKeys),
    AmbientDefault,
}

impl CredentialSpec {
    /// Parse settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidSettings(e.to_string()))
    }

    /// Pick the credential strategy by precedence, without validating it.
    ///
    /// Keys only count when both halves are present.
    pub fn strategy(&self) -> CredentialStrategy {
        if self.machine_role_assigned {
            return CredentialStrategy::MachineRole;
        }
        if let Some(profile) = non_empty(self.profile_name.as_ref()) {
            return CredentialStrategy::Profile(profile.to_string());
        }
        match (
            non_empty(self.access_key_id.as_ref()),
            non_empty(self.secret_access_key.as_ref()),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => {
                CredentialStrategy::StaticKeys(StaticKeys {
                    access_key_id: access_key_id.to_string(),
                    secret_access_key: secret_access_key.to_string(),
                    session_token: non_empty(self.session_token.as_ref()).map(str::to_string),
                })
            }
            _ => CredentialStrategy::AmbientDefault,
        }
    }

    /// Structurally validate the settings.
    ///
    /// Checks run in order: region, credential availability, key format,
    /// endpoint override. No I/O is performed.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigurationError> {
        let region = self.region.trim();
        if !is_published_region(region) {
            return Err(ConfigurationError::InvalidRegion(region.to_string()));
        }

        let strategy = match self.strategy() {
            CredentialStrategy::AmbientDefault => {
                return Err(ConfigurationError::MissingCredentials)
            }
            CredentialStrategy::StaticKeys(keys) => {
                if keys.access_key_id.chars().count() != ACCESS_KEY_ID_LEN
                    || keys.secret_access_key.chars().count() != SECRET_ACCESS_KEY_LEN
                {
                    return Err(ConfigurationError::InvalidKeyFormat);
                }
                CredentialStrategy::StaticKeys(keys)
            }
            other => other,
        };

        let endpoint_override = non_empty(self.endpoint_override.as_ref())
            .map(parse_endpoint)
            .transpose()?;

        Ok(ValidatedConfig {
            region: region.to_string(),
            endpoint_override,
            strategy,
        })
    }
}

/// Settings that passed structural validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub(crate) region: String,
    pub(crate) endpoint_override: Option<Url>,
    pub(crate) strategy: CredentialStrategy,
}

impl ValidatedConfig {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_override(&self) -> Option<&Url> {
        self.endpoint_override.as_ref()
    }

    pub fn strategy(&self) -> &CredentialStrategy {
        &self.strategy
    }
}

/// Validated settings together with the caller identity they resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub config: ValidatedConfig,
    pub caller_identity: String,
}

/// An endpoint override must be an absolute http(s) URL with a host
fn parse_endpoint(raw: &str) -> Result<Url, ConfigurationError> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .ok_or_else(|| ConfigurationError::InvalidEndpoint(raw.to_string()))
}
