//! Statement normalization
//!
//! Every statement field that IAM allows as string-or-list becomes a set: a bare
//! string becomes a one-element set and an absent field the empty set. Action and
//! resource strings are taken verbatim, without syntactic validation.

use super::document::{Effect, PolicyDocumentJson, RawStatement, StringOrList};
use serde::Serialize;
use std::collections::BTreeSet;

/// A statement with all four action/resource fields materialized as sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: BTreeSet<String>,
    #[serde(rename = "NotAction")]
    pub not_actions: BTreeSet<String>,
    #[serde(rename = "Resource")]
    pub resources: BTreeSet<String>,
    #[serde(rename = "NotResource")]
    pub not_resources: BTreeSet<String>,
}

/// How a policy document is attached to its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PolicySource {
    Inline,
    Managed { arn: String },
}

/// A named policy document with normalized statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub name: String,
    pub source: PolicySource,
    pub statements: Vec<Statement>,
}

pub struct StatementNormalizer;

impl StatementNormalizer {
    pub fn normalize(statement: &RawStatement) -> Statement {
        Statement {
            effect: statement.effect,
            actions: to_set(statement.action.as_ref()),
            not_actions: to_set(statement.not_action.as_ref()),
            resources: to_set(statement.resource.as_ref()),
            not_resources: to_set(statement.not_resource.as_ref()),
        }
    }

    /// Normalize every statement of a decoded document, keeping statement order
    pub fn normalize_document(
        name: impl Into<String>,
        source: PolicySource,
        document: &PolicyDocumentJson,
    ) -> PolicyDocument {
        PolicyDocument {
            name: name.into(),
            source,
            statements: document
                .statement
                .statements()
                .iter()
                .map(Self::normalize)
                .collect(),
        }
    }
}

fn to_set(field: Option<&StringOrList>) -> BTreeSet<String> {
    field
        .map(|value| value.values().iter().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawStatement {
        serde_json::from_str(json).unwrap()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_bare_string_becomes_singleton() {
        let statement =
            StatementNormalizer::normalize(&raw(r#"{"Effect":"Allow","Action":"s3:GetObject"}"#));
        assert_eq!(statement.actions, set(&["s3:GetObject"]));
    }

    #[test]
    fn test_list_becomes_set() {
        let statement =
            StatementNormalizer::normalize(&raw(r#"{"Effect":"Allow","Action":["a","b","a"]}"#));
        assert_eq!(statement.actions, set(&["a", "b"]));
    }

    #[test]
    fn test_missing_fields_become_empty_sets() {
        let statement =
            StatementNormalizer::normalize(&raw(r#"{"Effect":"Deny","Action":"s3:*"}"#));
        assert!(statement.resources.is_empty());
        assert!(statement.not_resources.is_empty());
        assert!(statement.not_actions.is_empty());
        assert_eq!(statement.effect, Effect::Deny);
    }

    #[test]
    fn test_strings_are_not_validated() {
        let statement = StatementNormalizer::normalize(&raw(
            r#"{"Effect":"Allow","NotAction":"definitely not an action","NotResource":[""]}"#,
        ));
        assert_eq!(statement.not_actions, set(&["definitely not an action"]));
        assert_eq!(statement.not_resources, set(&[""]));
    }

    #[test]
    fn test_normalize_document() {
        let document = PolicyDocumentJson::decode(
            r#"{"Statement":[{"Effect":"Allow","Action":"s3:GetObject","Resource":"*"},{"Effect":"Deny","Action":["s3:DeleteObject"]}]}"#,
        )
        .unwrap();
        let normalized =
            StatementNormalizer::normalize_document("ReadOnly", PolicySource::Inline, &document);
        assert_eq!(normalized.name, "ReadOnly");
        assert_eq!(normalized.statements.len(), 2);
        assert_eq!(normalized.statements[1].effect, Effect::Deny);
    }
}
