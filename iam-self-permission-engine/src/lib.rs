//! IAM Self Permission Engine
//!
//! This crate provides the core logic for inspecting what the current AWS
//! identity is allowed to do:
//! - Credential resolution from a single validated settings schema
//! - Identity classification from ARN strings
//! - Inline and managed policy collection, statement normalization and
//!   effective-permission aggregation
//! - Simulated access checks for one identity or the whole account
//!

pub mod access;
pub mod aws;
pub mod collector;
pub mod commands;
pub mod config;
mod error;
pub mod identity;
pub mod policy;
mod render;

#[cfg(test)]
mod test_support;

// Re-exports for a small, focused public API
pub use access::{AccessOutcome, AccessSubject, OutcomeCode, DEFAULT_RESOURCE};
pub use aws::AwsError;
pub use commands::SelfPermissionService;
pub use config::{ConfigurationError, CredentialSpec, CredentialStrategy, ValidatedConfig};
pub use error::{SelfPermissionError, SelfPermissionResult};
pub use identity::{Identity, IdentityResolver, IdentityType};
pub use policy::{EffectivePermissions, KeyspaceMode};
