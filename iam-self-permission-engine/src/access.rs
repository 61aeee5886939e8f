//! Access checks over the policy simulator.
//!
//! - check-access: one identity (user xor role) is simulated.
//! - search-access: the simulator enumerates every identity with access.
//!
//! Both report the outcome code `0` (allowed), `1` (denied / nobody has access)
//! or `2` (evaluation failed), with structured "sources" and "results" blocks.

use crate::aws::simulator::PolicySimulator;
use crate::error::{SelfPermissionError, SelfPermissionResult};
use crate::identity::{IdentityResolver, IdentityType};
use crate::render::{fenced_json, limit_indentation, pretty_json};
use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// Resource simulated when none is given
pub const DEFAULT_RESOURCE: &str = "*";

/// Nesting depth kept when displaying results, in units of [`RESULTS_INDENT`]
const RESULTS_INDENT_LIMIT: usize = 8;
const RESULTS_INDENT: &str = "  ";

/// An identity considered by a simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulationSource {
    pub arn: String,
    #[serde(rename = "Type")]
    pub identity_type: String,
}

impl SimulationSource {
    pub fn from_arn(arn: &str) -> Self {
        let identity_type = IdentityResolver::describe(arn)
            .map(|identity| identity.identity_type.to_string())
            .unwrap_or_else(|_| "Unknown".to_string());
        Self {
            arn: arn.to_string(),
            identity_type,
        }
    }
}

/// Simulated verdict for one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulationResult {
    pub identity_arn: String,
    pub action: String,
    pub resource: String,
    pub decision: String,
    pub allowed: bool,
    pub matched_policies: Vec<String>,
}

/// Structured output of a simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulationReport {
    pub sources: Vec<SimulationSource>,
    pub results: Vec<SimulationResult>,
}

impl SimulationReport {
    /// Whether any simulated identity is allowed
    pub fn allowed(&self) -> bool {
        self.results.iter().any(|result| result.allowed)
    }

    /// Results for identities that are allowed
    pub fn allowed_identities(&self) -> impl Iterator<Item = &SimulationResult> {
        self.results.iter().filter(|result| result.allowed)
    }
}

/// Outcome codes shared by check-access and search-access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeCode {
    Allowed,
    Denied,
    Failed,
}

impl OutcomeCode {
    pub fn code(self) -> i32 {
        match self {
            Self::Allowed => 0,
            Self::Denied => 1,
            Self::Failed => 2,
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The identity a check-access query is about: a user or a role, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessSubject {
    User(String),
    Role(String),
}

impl AccessSubject {
    /// Classify an identity ARN. Assumed roles are checked as their role.
    pub fn from_arn(arn: &str) -> SelfPermissionResult<Self> {
        let identity = IdentityResolver::classify(arn)?;
        match identity.identity_type {
            IdentityType::User => Ok(Self::User(identity.arn)),
            IdentityType::Role | IdentityType::AssumedRole => identity
                .simulation_arn()
                .map(Self::Role)
                .ok_or(SelfPermissionError::InvalidIdentityFormat(identity.arn)),
            IdentityType::Other => Err(SelfPermissionError::InvalidIdentityFormat(identity.arn)),
        }
    }

    pub fn arn(&self) -> &str {
        match self {
            Self::User(arn) | Self::Role(arn) => arn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessMode {
    Check,
    Search,
}

/// Result of a check-access or search-access query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessOutcome {
    pub mode: AccessMode,
    pub code: OutcomeCode,
    pub report: SimulationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccessOutcome {
    /// The "sources" block as pretty JSON
    pub fn sources_json(&self) -> serde_json::Result<String> {
        pretty_json(&self.report.sources)
    }

    /// The "results" block as pretty JSON, with deep nesting folded for display
    pub fn results_json(&self) -> serde_json::Result<String> {
        let json = pretty_json(&self.report.results)?;
        Ok(limit_indentation(&json, RESULTS_INDENT, RESULTS_INDENT_LIMIT))
    }

    /// Markdown rendering with both labeled blocks
    pub fn to_markdown(&self) -> serde_json::Result<String> {
        if let Some(error) = &self.error {
            return Ok(format!(
                "An error occurred while evaluating access: {error}"
            ));
        }
        let (sources_title, results_title) = match self.mode {
            AccessMode::Check => ("Identity checked sources:", "Access check results:"),
            AccessMode::Search => ("Identities searched sources:", "Access search results:"),
        };
        Ok(format!(
            "{sources_title}\n{}\n\n{results_title}\n{}\n",
            fenced_json(&self.sources_json()?),
            fenced_json(&self.results_json()?)
        ))
    }
}

/// Facade over a [`PolicySimulator`]
pub struct AccessEvaluator<'a> {
    simulator: &'a dyn PolicySimulator,
    debug: bool,
}

impl<'a> AccessEvaluator<'a> {
    pub fn new(simulator: &'a dyn PolicySimulator) -> Self {
        Self {
            simulator,
            debug: false,
        }
    }

    /// In debug mode simulation failures are returned as errors instead of
    /// being folded into outcome code `2`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Can `subject` perform `action` on `resource`?
    pub async fn check_access(
        &self,
        subject: &AccessSubject,
        action: &str,
        resource: Option<&str>,
    ) -> SelfPermissionResult<AccessOutcome> {
        self.run(AccessMode::Check, Some(subject.arn()), action, resource)
            .await
    }

    /// Which identities can perform `action` on `resource`?
    pub async fn search_access(
        &self,
        action: &str,
        resource: Option<&str>,
    ) -> SelfPermissionResult<AccessOutcome> {
        self.run(AccessMode::Search, None, action, resource).await
    }

    async fn run(
        &self,
        mode: AccessMode,
        principal_arn: Option<&str>,
        action: &str,
        resource: Option<&str>,
    ) -> SelfPermissionResult<AccessOutcome> {
        let resource = resource.unwrap_or(DEFAULT_RESOURCE);
        info!(
            "{mode:?} access: {action} on {resource} for {}",
            principal_arn.unwrap_or("all identities")
        );

        match self.simulator.evaluate(principal_arn, action, resource).await {
            Ok(report) => {
                let code = if report.allowed() {
                    OutcomeCode::Allowed
                } else {
                    OutcomeCode::Denied
                };
                Ok(AccessOutcome {
                    mode,
                    code,
                    report,
                    error: None,
                })
            }
            Err(e) if self.debug => Err(SelfPermissionError::Simulation(e)),
            Err(e) => {
                warn!("Access evaluation failed: {e}");
                Ok(AccessOutcome {
                    mode,
                    code: OutcomeCode::Failed,
                    report: SimulationReport::default(),
                    error: Some(e.to_string()),
                })
            }
        }
    }
}
