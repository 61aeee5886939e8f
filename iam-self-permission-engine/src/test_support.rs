//! In-memory doubles for the AWS capabilities

use crate::access::{SimulationReport, SimulationResult, SimulationSource};
use crate::aws::iam_client::{AttachedPolicy, IamApi};
use crate::aws::simulator::PolicySimulator;
use crate::aws::sts::{CallerIdentity, CallerIdentityApi};
use crate::aws::{AwsError, AwsResult};
use crate::identity::PrincipalKind;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

type PrincipalKey = (PrincipalKind, String);

#[derive(Default)]
pub(crate) struct MockIam {
    inline: HashMap<PrincipalKey, Vec<(String, String)>>,
    attached: HashMap<PrincipalKey, Vec<AttachedPolicy>>,
    versions: HashMap<String, String>,
    trust: HashMap<String, String>,
    groups: HashMap<String, Vec<String>>,
    mfa: HashMap<String, Vec<String>>,
    summary: BTreeMap<String, i32>,
    calls: AtomicUsize,
    trust_calls: AtomicUsize,
}

impl MockIam {
    pub(crate) fn with_inline(
        mut self,
        kind: PrincipalKind,
        principal: &str,
        policy_name: &str,
        document: &str,
    ) -> Self {
        self.inline
            .entry((kind, principal.to_string()))
            .or_default()
            .push((policy_name.to_string(), document.to_string()));
        self
    }

    pub(crate) fn with_attached(
        mut self,
        kind: PrincipalKind,
        principal: &str,
        policy_name: &str,
        policy_arn: &str,
        document: &str,
    ) -> Self {
        self.versions
            .insert(policy_arn.to_string(), document.to_string());
        self.with_attached_without_document(kind, principal, policy_name, policy_arn)
    }

    pub(crate) fn with_attached_without_document(
        mut self,
        kind: PrincipalKind,
        principal: &str,
        policy_name: &str,
        policy_arn: &str,
    ) -> Self {
        self.attached
            .entry((kind, principal.to_string()))
            .or_default()
            .push(AttachedPolicy {
                name: policy_name.to_string(),
                arn: policy_arn.to_string(),
            });
        self
    }

    pub(crate) fn with_trust_policy(mut self, role: &str, document: &str) -> Self {
        self.trust.insert(role.to_string(), document.to_string());
        self
    }

    pub(crate) fn with_groups(mut self, user: &str, groups: &[&str]) -> Self {
        self.groups.insert(
            user.to_string(),
            groups.iter().map(|g| g.to_string()).collect(),
        );
        self
    }

    pub(crate) fn with_mfa_devices(mut self, user: &str, serials: &[&str]) -> Self {
        self.mfa.insert(
            user.to_string(),
            serials.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub(crate) fn with_summary(mut self, key: &str, value: i32) -> Self {
        self.summary.insert(key.to_string(), value);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn trust_policy_calls(&self) -> usize {
        self.trust_calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn no_such_entity(what: &str) -> AwsError {
    AwsError::IamError(format!("NoSuchEntity: {what}"))
}

#[async_trait]
impl IamApi for MockIam {
    async fn list_inline_policies(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> AwsResult<Vec<String>> {
        self.record_call();
        Ok(self
            .inline
            .get(&(kind, principal_name.to_string()))
            .map(|policies| policies.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_inline_policy(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
        policy_name: &str,
    ) -> AwsResult<String> {
        self.record_call();
        self.inline
            .get(&(kind, principal_name.to_string()))
            .and_then(|policies| policies.iter().find(|(name, _)| name == policy_name))
            .map(|(_, document)| document.clone())
            .ok_or_else(|| no_such_entity(policy_name))
    }

    async fn list_attached_policies(
        &self,
        kind: PrincipalKind,
        principal_name: &str,
    ) -> AwsResult<Vec<AttachedPolicy>> {
        self.record_call();
        Ok(self
            .attached
            .get(&(kind, principal_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_default_policy_version(&self, policy_arn: &str) -> AwsResult<String> {
        self.record_call();
        self.versions
            .get(policy_arn)
            .cloned()
            .ok_or_else(|| no_such_entity(policy_arn))
    }

    async fn get_role_trust_policy(&self, role_name: &str) -> AwsResult<String> {
        self.record_call();
        self.trust_calls.fetch_add(1, Ordering::SeqCst);
        self.trust
            .get(role_name)
            .cloned()
            .ok_or_else(|| no_such_entity(role_name))
    }

    async fn list_groups_for_user(&self, user_name: &str) -> AwsResult<Vec<String>> {
        self.record_call();
        Ok(self.groups.get(user_name).cloned().unwrap_or_default())
    }

    async fn list_mfa_devices(&self, user_name: &str) -> AwsResult<Vec<String>> {
        self.record_call();
        Ok(self.mfa.get(user_name).cloned().unwrap_or_default())
    }

    async fn get_account_summary(&self) -> AwsResult<BTreeMap<String, i32>> {
        self.record_call();
        Ok(self.summary.clone())
    }
}

pub(crate) struct MockSts {
    identity: Option<CallerIdentity>,
}

impl MockSts {
    pub(crate) fn returning(arn: &str) -> Self {
        Self {
            identity: Some(CallerIdentity {
                user_id: "AIDAEXAMPLEUSERID".to_string(),
                account: crate::identity::extract_account_from_arn(arn).unwrap_or_default(),
                arn: arn.to_string(),
            }),
        }
    }

    pub(crate) fn failing() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl CallerIdentityApi for MockSts {
    async fn get_caller_identity(&self) -> AwsResult<CallerIdentity> {
        self.identity
            .clone()
            .ok_or_else(|| AwsError::StsError("InvalidClientTokenId".to_string()))
    }
}

/// Simulator with a fixed set of identities and the actions each may perform
#[derive(Default)]
pub(crate) struct MockSimulator {
    grants: BTreeMap<String, Vec<String>>,
    fail: bool,
}

impl MockSimulator {
    pub(crate) fn with_identity(mut self, arn: &str, allowed_actions: &[&str]) -> Self {
        self.grants.insert(
            arn.to_string(),
            allowed_actions.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn verdict(&self, arn: &str, action: &str, resource: &str) -> SimulationResult {
        let allowed = self
            .grants
            .get(arn)
            .is_some_and(|actions| actions.iter().any(|a| a == action));
        SimulationResult {
            identity_arn: arn.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            decision: if allowed { "allowed" } else { "implicitDeny" }.to_string(),
            allowed,
            matched_policies: Vec::new(),
        }
    }
}

#[async_trait]
impl PolicySimulator for MockSimulator {
    async fn evaluate(
        &self,
        principal_arn: Option<&str>,
        action: &str,
        resource: &str,
    ) -> AwsResult<SimulationReport> {
        if self.fail {
            return Err(AwsError::SimulationError("AccessDenied".to_string()));
        }
        let arns: Vec<String> = match principal_arn {
            Some(arn) => vec![arn.to_string()],
            None => self.grants.keys().cloned().collect(),
        };
        Ok(SimulationReport {
            sources: arns
                .iter()
                .map(|arn| SimulationSource::from_arn(arn))
                .collect(),
            results: arns
                .iter()
                .map(|arn| self.verdict(arn, action, resource))
                .collect(),
        })
    }
}
