//! Policy documents: wire model, statement normalization, effective-permission aggregation

pub mod aggregate;
pub mod document;
pub mod normalize;

pub use aggregate::{
    EffectivePermissionAggregator, EffectivePermissions, KeyspaceMode, PermissionEntry,
};
pub use document::{
    decode_policy_value, Effect, PolicyDocumentJson, RawStatement, StatementList, StringOrList,
};
pub use normalize::{PolicyDocument, PolicySource, Statement, StatementNormalizer};
