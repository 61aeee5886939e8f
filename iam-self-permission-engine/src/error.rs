//! Error taxonomy surfaced at the engine boundary

use crate::aws::AwsError;
use crate::config::ConfigurationError;
use thiserror::Error;

/// Errors returned by the self-permission engine.
///
/// Variants are discriminated so a presentation layer can tell fatal
/// configuration problems apart from failures of a single network call.
/// The engine itself never retries.
#[derive(Error, Debug)]
pub enum SelfPermissionError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Authentication(#[source] AwsError),

    #[error("Failed to fetch policy '{policy_name}': {source}")]
    PolicyFetch {
        policy_name: String,
        #[source]
        source: AwsError,
    },

    #[error("Invalid identity ARN format: {0}")]
    InvalidIdentityFormat(String),

    #[error("Not applicable for identity type: {identity_type}")]
    NotApplicable { identity_type: String },

    #[error("Policy simulation failed: {0}")]
    Simulation(#[source] AwsError),

    #[error("IAM request failed: {0}")]
    Aws(#[from] AwsError),
}

impl SelfPermissionError {
    pub(crate) fn policy_fetch(policy_name: impl Into<String>, source: AwsError) -> Self {
        Self::PolicyFetch {
            policy_name: policy_name.into(),
            source,
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Configuration, identity-format and rejected-credential failures are
    /// deterministic and surfaced as is. Fetch and simulation failures may be
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_)
            | Self::Authentication(_)
            | Self::InvalidIdentityFormat(_)
            | Self::NotApplicable { .. } => false,
            Self::PolicyFetch { .. } | Self::Simulation(_) | Self::Aws(_) => true,
        }
    }
}

/// Result type for engine operations
pub type SelfPermissionResult<T> = Result<T, SelfPermissionError>;
