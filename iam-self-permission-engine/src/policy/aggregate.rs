//! Effective-permission aggregation
//!
//! For every statement the cross product `(Action ∪ NotAction) × (Resource ∪ NotResource)`
//! is recorded under the statement's effect, keyed by the action string. Each
//! bucket ends up as a sorted list of distinct resources.
//!
//! This is an informational summary, not access evaluation: the same token can
//! carry both a non-empty Allow and a non-empty Deny list.

use super::document::Effect;
use super::normalize::PolicyDocument;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Whether `Action` and `NotAction` tokens share one keyspace.
///
/// [`KeyspaceMode::Conflate`] merges them under the bare token, so a `NotAction`
/// on `iam:*` is indistinguishable from an `Action` on `iam:*`. That reproduces
/// the established output shape. [`KeyspaceMode::Discriminate`] keeps them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyspaceMode {
    #[default]
    Conflate,
    Discriminate,
}

/// Resources a token is allowed and denied on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionEntry {
    #[serde(rename = "Allow")]
    pub allow: Vec<String>,
    #[serde(rename = "Deny")]
    pub deny: Vec<String>,
}

/// Aggregated permissions for one identity.
///
/// Serializes as `{"<action>": {"Allow": [...], "Deny": [...]}}` in conflate mode and
/// as `{"Action": {...}, "NotAction": {...}}` in discriminate mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissions {
    mode: KeyspaceMode,
    actions: BTreeMap<String, PermissionEntry>,
    not_actions: BTreeMap<String, PermissionEntry>,
}

impl EffectivePermissions {
    pub fn mode(&self) -> KeyspaceMode {
        self.mode
    }

    /// Entry for an action token (any token, in conflate mode)
    pub fn get(&self, token: &str) -> Option<&PermissionEntry> {
        self.actions.get(token)
    }

    /// Entry for a `NotAction` token; always `None` in conflate mode
    pub fn get_not_action(&self, token: &str) -> Option<&PermissionEntry> {
        self.not_actions.get(token)
    }

    pub fn actions(&self) -> &BTreeMap<String, PermissionEntry> {
        &self.actions
    }

    pub fn not_actions(&self) -> &BTreeMap<String, PermissionEntry> {
        &self.not_actions
    }

    pub fn len(&self) -> usize {
        self.actions.len() + self.not_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.not_actions.is_empty()
    }
}

impl Serialize for EffectivePermissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.mode {
            KeyspaceMode::Conflate => self.actions.serialize(serializer),
            KeyspaceMode::Discriminate => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("Action", &self.actions)?;
                map.serialize_entry("NotAction", &self.not_actions)?;
                map.end()
            }
        }
    }
}

#[derive(Default)]
struct Buckets {
    allow: BTreeSet<String>,
    deny: BTreeSet<String>,
}

impl Buckets {
    fn record(&mut self, effect: Effect, resource: &str) {
        let bucket = match effect {
            Effect::Allow => &mut self.allow,
            Effect::Deny => &mut self.deny,
        };
        if !bucket.contains(resource) {
            bucket.insert(resource.to_string());
        }
    }

    fn into_entry(self) -> PermissionEntry {
        PermissionEntry {
            allow: self.allow.into_iter().collect(),
            deny: self.deny.into_iter().collect(),
        }
    }
}

/// Folds normalized policy documents into [`EffectivePermissions`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectivePermissionAggregator {
    mode: KeyspaceMode,
}

impl EffectivePermissionAggregator {
    pub fn new(mode: KeyspaceMode) -> Self {
        Self { mode }
    }

    /// Aggregate every statement of every document.
    ///
    /// The accumulator is local to the call, and the output depends only on the
    /// set of statements, not on document or statement order.
    pub fn aggregate(&self, documents: &[PolicyDocument]) -> EffectivePermissions {
        let mut actions: BTreeMap<String, Buckets> = BTreeMap::new();
        let mut not_actions: BTreeMap<String, Buckets> = BTreeMap::new();

        for statement in documents.iter().flat_map(|doc| &doc.statements) {
            let resources: Vec<&String> = statement
                .resources
                .iter()
                .chain(&statement.not_resources)
                .collect();

            let not_action_keyspace = match self.mode {
                KeyspaceMode::Conflate => &mut actions,
                KeyspaceMode::Discriminate => &mut not_actions,
            };
            for token in &statement.not_actions {
                record_all(not_action_keyspace, token, statement.effect, &resources);
            }
            for token in &statement.actions {
                record_all(&mut actions, token, statement.effect, &resources);
            }
        }

        EffectivePermissions {
            mode: self.mode,
            actions: finish(actions),
            not_actions: finish(not_actions),
        }
    }
}

fn record_all(
    keyspace: &mut BTreeMap<String, Buckets>,
    token: &str,
    effect: Effect,
    resources: &[&String],
) {
    // A token only appears once it has at least one resource.
    if resources.is_empty() {
        return;
    }
    let buckets = keyspace.entry(token.to_string()).or_default();
    for resource in resources {
        buckets.record(effect, resource);
    }
}

fn finish(keyspace: BTreeMap<String, Buckets>) -> BTreeMap<String, PermissionEntry> {
    keyspace
        .into_iter()
        .map(|(token, buckets)| (token, buckets.into_entry()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyDocumentJson, PolicySource, StatementNormalizer};

    fn document(name: &str, json: &str) -> PolicyDocument {
        let raw = PolicyDocumentJson::decode(json).unwrap();
        StatementNormalizer::normalize_document(name, PolicySource::Inline, &raw)
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_cross_product_of_actions_and_resources() {
        let docs = vec![document(
            "p",
            r#"{"Statement":[{"Effect":"Allow","Action":["s3:GetObject","s3:PutObject"],"Resource":["arn:b1","arn:b2"]}]}"#,
        )];
        let permissions = EffectivePermissionAggregator::default().aggregate(&docs);

        assert_eq!(permissions.len(), 2);
        for token in ["s3:GetObject", "s3:PutObject"] {
            let entry = permissions.get(token).unwrap();
            assert_eq!(entry.allow, strings(&["arn:b1", "arn:b2"]));
            assert!(entry.deny.is_empty());
        }
    }

    #[test]
    fn test_duplicate_grants_collapse() {
        let docs = vec![
            document(
                "a",
                r#"{"Statement":[{"Effect":"Allow","Action":"s3:GetObject","Resource":"arn:z"},{"Effect":"Allow","Action":"s3:GetObject","Resource":["arn:a","arn:z"]}]}"#,
            ),
            document(
                "b",
                r#"{"Statement":{"Effect":"Allow","Action":"s3:GetObject","Resource":"arn:a"}}"#,
            ),
        ];
        let permissions = EffectivePermissionAggregator::default().aggregate(&docs);
        assert_eq!(
            permissions.get("s3:GetObject").unwrap().allow,
            strings(&["arn:a", "arn:z"])
        );
    }

    #[test]
    fn test_allow_and_deny_coexist() {
        let docs = vec![document(
            "p",
            r#"{"Statement":[{"Effect":"Allow","Action":"s3:*","Resource":"*"},{"Effect":"Deny","Action":"s3:*","Resource":"arn:aws:s3:::secret/*"}]}"#,
        )];
        let permissions = EffectivePermissionAggregator::default().aggregate(&docs);
        let entry = permissions.get("s3:*").unwrap();
        assert_eq!(entry.allow, strings(&["*"]));
        assert_eq!(entry.deny, strings(&["arn:aws:s3:::secret/*"]));
    }

    #[test]
    fn test_not_resource_joins_resource_bucket() {
        let docs = vec![document(
            "p",
            r#"{"Statement":[{"Effect":"Deny","Action":"iam:*","Resource":"arn:r1","NotResource":"arn:r0"}]}"#,
        )];
        let permissions = EffectivePermissionAggregator::default().aggregate(&docs);
        assert_eq!(
            permissions.get("iam:*").unwrap().deny,
            strings(&["arn:r0", "arn:r1"])
        );
    }

    #[test]
    fn test_statement_without_resources_contributes_nothing() {
        let docs = vec![document(
            "p",
            r#"{"Statement":[{"Effect":"Allow","Action":"s3:GetObject"}]}"#,
        )];
        let permissions = EffectivePermissionAggregator::default().aggregate(&docs);
        assert!(permissions.is_empty());
    }

    // Fixture assumes conflate mode: NotAction tokens land in the action keyspace.
    #[test]
    fn test_conflate_merges_not_action_tokens() {
        let docs = vec![document(
            "p",
            r#"{"Statement":[{"Effect":"Allow","Action":"iam:*","Resource":"arn:a"},{"Effect":"Deny","NotAction":"iam:*","Resource":"arn:b"}]}"#,
        )];
        let permissions = EffectivePermissionAggregator::new(KeyspaceMode::Conflate).aggregate(&docs);
        let entry = permissions.get("iam:*").unwrap();
        assert_eq!(entry.allow, strings(&["arn:a"]));
        assert_eq!(entry.deny, strings(&["arn:b"]));
        assert!(permissions.get_not_action("iam:*").is_none());

        let json = serde_json::to_value(&permissions).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"iam:*": {"Allow": ["arn:a"], "Deny": ["arn:b"]}})
        );
    }

    // Fixture assumes discriminate mode.
    #[test]
    fn test_discriminate_separates_not_action_tokens() {
        let docs = vec![document(
            "p",
            r#"{"Statement":[{"Effect":"Allow","Action":"iam:*","Resource":"arn:a"},{"Effect":"Deny","NotAction":"iam:*","Resource":"arn:b"}]}"#,
        )];
        let permissions =
            EffectivePermissionAggregator::new(KeyspaceMode::Discriminate).aggregate(&docs);
        assert_eq!(permissions.get("iam:*").unwrap().deny, Vec::<String>::new());
        assert_eq!(
            permissions.get_not_action("iam:*").unwrap().deny,
            strings(&["arn:b"])
        );

        let json = serde_json::to_value(&permissions).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Action": {"iam:*": {"Allow": ["arn:a"], "Deny": []}},
                "NotAction": {"iam:*": {"Allow": [], "Deny": ["arn:b"]}}
            })
        );
    }

    #[test]
    fn test_aggregation_is_idempotent_and_order_independent() {
        let a = document(
            "a",
            r#"{"Statement":[{"Effect":"Allow","Action":["s3:GetObject","ec2:Describe*"],"Resource":["arn:2","arn:1"]}]}"#,
        );
        let b = document(
            "b",
            r#"{"Statement":[{"Effect":"Deny","Action":"s3:GetObject","Resource":"arn:3"}]}"#,
        );
        let aggregator = EffectivePermissionAggregator::default();
        let first = aggregator.aggregate(&[a.clone(), b.clone()]);
        let second = aggregator.aggregate(&[a.clone(), b.clone()]);
        let reversed = aggregator.aggregate(&[b, a]);
        assert_eq!(first, second);
        assert_eq!(first, reversed);
        assert_eq!(
            first.get("s3:GetObject").unwrap().allow,
            strings(&["arn:1", "arn:2"])
        );
    }
}
