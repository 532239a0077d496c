//! `rolekit-core`: identifier and validation primitives.
//!
//! This crate contains **pure** building blocks (no storage, no transport).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{optional_role_id, RoleId, UserId};
