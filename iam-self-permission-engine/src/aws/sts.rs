//! Caller identity lookup ("who am I")

use crate::aws::{AwsError, AwsResult};
use async_trait::async_trait;
use aws_sdk_sts::Client as StsClient;
use log::debug;
use serde::Serialize;

/// Result of a GetCallerIdentity call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub user_id: String,
    pub account: String,
    pub arn: String,
}

/// Capability to ask who the configured credentials belong to
#[async_trait]
pub trait CallerIdentityApi: Send + Sync {
    async fn get_caller_identity(&self) -> AwsResult<CallerIdentity>;
}

pub struct AwsStsClient {
    client: StsClient,
}

impl AwsStsClient {
    pub fn new(client: StsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallerIdentityApi for AwsStsClient {
    async fn get_caller_identity(&self) -> AwsResult<CallerIdentity> {
        let response = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| AwsError::StsError(format!("Failed to get caller identity: {e}")))?;
        debug!("AWS caller identity response: {response:?}");

        let arn = response
            .arn()
            .ok_or_else(|| AwsError::StsError("Caller identity response has no Arn".to_string()))?;

        Ok(CallerIdentity {
            user_id: response.user_id().unwrap_or_default().to_string(),
            account: response.account().unwrap_or_default().to_string(),
            arn: arn.to_string(),
        })
    }
}
