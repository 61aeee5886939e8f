//! Commands module - service layer for self-permission queries

mod access;
mod identity;
mod permissions;
pub(crate) mod service;
pub mod summary;

pub use service::SelfPermissionService;
