//! Policy document wire model (pure Rust)
//!
//! IAM allows most statement fields to be either a single string or a list of
//! strings, and `Statement` itself to be a single object or a list.

use crate::aws::{AwsError, AwsResult};
use serde::{Deserialize, Serialize};

/// A field that can be a single string or list of strings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrList {
    Single(String),
    Multiple(Vec<String>),
}

impl StringOrList {
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        }
    }
}

/// Effect of an IAM policy statement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

/// One statement as written in the policy JSON.
///
/// Principal and Condition are not modeled; they play no part in the
/// effective-permission summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RawStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_action: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_resource: Option<StringOrList>,
}

/// `Statement` can be a single object or list of objects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatementList {
    Single(Box<RawStatement>),
    Multiple(Vec<RawStatement>),
}

impl StatementList {
    pub fn statements(&self) -> &[RawStatement] {
        match self {
            Self::Single(statement) => std::slice::from_ref(statement.as_ref()),
            Self::Multiple(statements) => statements,
        }
    }
}

/// Policy document structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocumentJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub statement: StatementList,
}

impl PolicyDocumentJson {
    /// Decode a policy document as returned by IAM (URL-encoded JSON)
    pub fn decode(raw: &str) -> AwsResult<Self> {
        let decoded = url_decode(raw)?;
        serde_json::from_str(&decoded)
            .map_err(|e| AwsError::PolicyError(format!("Failed to parse policy document JSON: {e}")))
    }
}

/// Decode a policy document into untyped JSON, keeping every field.
///
/// Used for trust policies, which are displayed rather than aggregated.
pub fn decode_policy_value(raw: &str) -> AwsResult<serde_json::Value> {
    let decoded = url_decode(raw)?;
    serde_json::from_str(&decoded)
        .map_err(|e| AwsError::PolicyError(format!("Failed to parse policy document JSON: {e}")))
}

// AWS returns URL-encoded JSON; plain JSON passes through unchanged.
fn url_decode(raw: &str) -> AwsResult<String> {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| AwsError::PolicyError(format!("Failed to URL decode policy document: {e}")))
}
