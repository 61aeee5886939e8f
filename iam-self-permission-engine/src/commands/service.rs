//! Self-permission service layer
//!
//! This module provides the service interface that ties the pipeline together.
//! The service holds the IAM, STS and simulation capabilities and exposes one
//! operation per produced output. Every operation starts from a fresh caller
//! identity lookup; nothing is cached between calls.

use crate::aws::iam_client::{AwsIamClient, IamApi};
use crate::aws::session::{AwsSession, CredentialResolver};
use crate::aws::simulator::{IamPolicySimulator, PolicySimulator};
use crate::aws::sts::{AwsStsClient, CallerIdentity, CallerIdentityApi};
use crate::config::{CredentialSpec, ResolvedSettings};
use crate::error::{SelfPermissionError, SelfPermissionResult};
use crate::identity::{Identity, IdentityResolver};
use std::sync::Arc;

/// Main service struct that holds AWS capabilities and provides query operations
pub struct SelfPermissionService {
    pub(crate) iam: Arc<dyn IamApi>,
    pub(crate) sts: Arc<dyn CallerIdentityApi>,
    pub(crate) simulator: Arc<dyn PolicySimulator>,
    pub(crate) debug: bool,
    settings: Option<ResolvedSettings>,
}

impl SelfPermissionService {
    /// Create a service from credential settings
    ///
    /// Validates the settings, builds the AWS session and resolves the caller
    /// identity once so bad credentials fail here rather than mid-query.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings and an authentication
    /// error when the caller identity cannot be resolved.
    pub async fn new(spec: &CredentialSpec) -> SelfPermissionResult<Self> {
        let (session, settings) = CredentialResolver::resolve(spec).await?;
        let mut service = Self::from_session(&session);
        service.settings = Some(settings);
        Ok(service)
    }

    /// Create a service over an existing session without resolving the caller
    pub fn from_session(session: &AwsSession) -> Self {
        let iam_client = session.iam_client();
        Self::with_clients(
            Arc::new(AwsIamClient::new(iam_client.clone())),
            Arc::new(AwsStsClient::new(session.sts_client())),
            Arc::new(IamPolicySimulator::new(iam_client)),
        )
    }

    pub fn with_clients(
        iam: Arc<dyn IamApi>,
        sts: Arc<dyn CallerIdentityApi>,
        simulator: Arc<dyn PolicySimulator>,
    ) -> Self {
        Self {
            iam,
            sts,
            simulator,
            debug: false,
            settings: None,
        }
    }

    /// Propagate simulation failures instead of reporting outcome code 2
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Settings and caller identity recorded when the service was created
    pub fn settings(&self) -> Option<&ResolvedSettings> {
        self.settings.as_ref()
    }

    pub(crate) async fn caller(&self) -> SelfPermissionResult<CallerIdentity> {
        self.sts
            .get_caller_identity()
            .await
            .map_err(SelfPermissionError::Authentication)
    }

    pub(crate) async fn caller_identity(&self) -> SelfPermissionResult<Identity> {
        let caller = self.caller().await?;
        IdentityResolver::describe(&caller.arn)
    }

    // identity queries are in identity.rs
    // policy and permission queries are in permissions.rs
    // access checks are in access.rs
}
