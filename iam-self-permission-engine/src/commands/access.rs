use crate::access::{AccessEvaluator, AccessOutcome, AccessSubject};
use crate::error::SelfPermissionResult;

impl super::service::SelfPermissionService {
    /// Simulate whether one user or role may perform `action`.
    ///
    /// The identity is classified before the simulator is called; an assumed-role
    /// session is checked as its role. `resource` defaults to `*`.
    pub async fn check_access(
        &self,
        identity_arn: &str,
        action: &str,
        resource: Option<&str>,
    ) -> SelfPermissionResult<AccessOutcome> {
        let subject = AccessSubject::from_arn(identity_arn)?;
        self.evaluator()
            .check_access(&subject, action, resource)
            .await
    }

    /// Find every identity in the account that may perform `action`
    pub async fn search_access(
        &self,
        action: &str,
        resource: Option<&str>,
    ) -> SelfPermissionResult<AccessOutcome> {
        self.evaluator().search_access(action, resource).await
    }

    fn evaluator(&self) -> AccessEvaluator<'_> {
        AccessEvaluator::new(self.simulator.as_ref()).with_debug(self.debug)
    }
}
