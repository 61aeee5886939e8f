//! Policy simulation backed by IAM SimulatePrincipalPolicy

use crate::access::{SimulationReport, SimulationResult, SimulationSource};
use crate::aws::{AwsError, AwsResult};
use async_trait::async_trait;
use aws_sdk_iam::types::PolicyEvaluationDecisionType;
use aws_sdk_iam::Client as IamClient;
use log::{debug, info};

/// Evaluates, without executing, whether identities may perform an action.
///
/// With a principal ARN the report covers that identity only; without one the
/// simulator enumerates every identity it knows about.
#[async_trait]
pub trait PolicySimulator: Send + Sync {
    async fn evaluate(
        &self,
        principal_arn: Option<&str>,
        action: &str,
        resource: &str,
    ) -> AwsResult<SimulationReport>;
}

pub struct IamPolicySimulator {
    client: IamClient,
}

impl IamPolicySimulator {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    /// ARNs of every IAM user and role in the account
    async fn list_identity_arns(&self) -> AwsResult<Vec<String>> {
        let users = self
            .client
            .list_users()
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| AwsError::SimulationError(format!("Failed to list users: {e}")))?;
        let roles = self
            .client
            .list_roles()
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| AwsError::SimulationError(format!("Failed to list roles: {e}")))?;
        info!(
            "Enumerated {} users and {} roles for simulation",
            users.len(),
            roles.len()
        );

        Ok(users
            .iter()
            .map(|user| user.arn().to_string())
            .chain(roles.iter().map(|role| role.arn().to_string()))
            .collect())
    }

    async fn simulate(
        &self,
        principal_arn: &str,
        action: &str,
        resource: &str,
    ) -> AwsResult<SimulationResult> {
        let response = self
            .client
            .simulate_principal_policy()
            .policy_source_arn(principal_arn)
            .action_names(action)
            .resource_arns(resource)
            .send()
            .await
            .map_err(|e| {
                AwsError::SimulationError(format!(
                    "Failed to simulate {action} on {resource} for {principal_arn}: {e}"
                ))
            })?;

        let evaluation = response.evaluation_results().first().ok_or_else(|| {
            AwsError::SimulationError(format!(
                "Simulation for {principal_arn} returned no evaluation results"
            ))
        })?;
        let decision = evaluation.eval_decision();
        debug!("{principal_arn}: {action} on {resource} -> {}", decision.as_str());

        Ok(SimulationResult {
            identity_arn: principal_arn.to_string(),
            action: evaluation.eval_action_name().to_string(),
            resource: evaluation
                .eval_resource_name()
                .unwrap_or(resource)
                .to_string(),
            decision: decision.as_str().to_string(),
            allowed: matches!(decision, PolicyEvaluationDecisionType::Allowed),
            matched_policies: evaluation
                .matched_statements()
                .iter()
                .filter_map(|statement| statement.source_policy_id())
                .map(str::to_string)
                .collect(),
        })
    }
}

#[async_trait]
impl PolicySimulator for IamPolicySimulator {
    async fn evaluate(
        &self,
        principal_arn: Option<&str>,
        action: &str,
        resource: &str,
    ) -> AwsResult<SimulationReport> {
        let arns = match principal_arn {
            Some(arn) => vec![arn.to_string()],
            None => self.list_identity_arns().await?,
        };

        let mut report = SimulationReport::default();
        for arn in arns {
            let result = self.simulate(&arn, action, resource).await?;
            report.sources.push(SimulationSource::from_arn(&arn));
            report.results.push(result);
        }
        Ok(report)
    }
}
