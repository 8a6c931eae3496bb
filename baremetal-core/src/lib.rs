//! Baremetal Core Library
//!
//! Shared types, models, and utilities for the bare metal provisioning API
//! client. This crate carries no transport: it is used by the SDK managers
//! and the CLI alike.

pub mod api;
pub mod error;
pub mod fields;
pub mod resource;

// Re-export commonly used types
pub use api::{ListQuery, PatchOp, PatchOperation, SortDir};
pub use error::*;
pub use fields::ResourceFields;
pub use resource::Resource;
