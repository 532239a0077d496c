//! `rolekit-auth`: flat role-based access control.
//!
//! One role per user, one permission set per role, membership checks only.
//! This crate is decoupled from HTTP and from any concrete storage.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod permissions;
pub mod publication;
pub mod role_store;
pub mod roles;
pub mod store;
pub mod user_role_index;

pub use authorize::{AuthorizationExplanation, AuthorizationService};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::AuthzError;
pub use permissions::{Permission, Permissions};
pub use publication::UserRolePublication;
pub use role_store::RoleStore;
pub use roles::Role;
pub use store::{RoleRepository, StoreError, UserRepository};
pub use user_role_index::UserRoleIndex;
