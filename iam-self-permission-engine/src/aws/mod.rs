//! AWS SDK integration: session construction, IAM/STS capabilities, policy simulation.
//!
//! Each capability the engine consumes is a trait so the pipeline can be driven
//! by the SDK-backed implementations here or by in-memory doubles in tests.

pub mod iam_client;
pub mod session;
pub mod simulator;
pub mod sts;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("IAM client error: {0}")]
    IamError(String),
    #[error("STS client error: {0}")]
    StsError(String),
    #[error("Policy document error: {0}")]
    PolicyError(String),
    #[error("Policy simulation error: {0}")]
    SimulationError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;
