//! Document store contract.
//!
//! These traits describe exactly what the permission model needs from
//! storage: lookups by id, a count-with-filter query, and atomic set
//! updates. Implementations live in `rolekit-infra`.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use rolekit_core::{RoleId, UserId};

use crate::{Permission, Role};

/// Infrastructure failure raised by a repository.
///
/// Never used for "not found" or "not allowed"; those are normal results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Roles collection.
///
/// Set updates (`add_to_set`, `remove_from_set`, `replace_permissions`) must
/// be single atomic operations on the backend, never read-modify-write in
/// application code. Each returns the role as it is after the write, or
/// `None` when no role has that id.
#[async_trait::async_trait]
pub trait RoleRepository: Send + Sync {
    async fn insert(&self, role: Role) -> Result<(), StoreError>;

    /// Remove a role. Returns whether a document was removed.
    async fn delete(&self, id: &RoleId) -> Result<bool, StoreError>;

    async fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError>;

    async fn list(&self) -> Result<Vec<Role>, StoreError>;

    /// Number of roles with this id.
    async fn count(&self, id: &RoleId) -> Result<u64, StoreError>;

    /// Number of roles with this id whose permissions contain all of `required`.
    async fn count_with_all(
        &self,
        id: &RoleId,
        required: &BTreeSet<Permission>,
    ) -> Result<u64, StoreError>;

    async fn add_to_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError>;

    async fn remove_from_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError>;

    async fn replace_permissions(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError>;
}

/// Users collection, reduced to the one field this crate reads and writes.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// The user's `role_id` field, or `None` for an unknown user or unset field.
    async fn find_role_id(&self, user_id: &UserId) -> Result<Option<RoleId>, StoreError>;

    /// Set (or clear) the user's `role_id` field, creating the record if needed.
    async fn set_role_id(&self, user_id: &UserId, role_id: Option<&RoleId>) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<R> RoleRepository for Arc<R>
where
    R: RoleRepository + ?Sized,
{
    async fn insert(&self, role: Role) -> Result<(), StoreError> {
        (**self).insert(role).await
    }

    async fn delete(&self, id: &RoleId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        (**self).find(id).await
    }

    async fn list(&self) -> Result<Vec<Role>, StoreError> {
        (**self).list().await
    }

    async fn count(&self, id: &RoleId) -> Result<u64, StoreError> {
        (**self).count(id).await
    }

    async fn count_with_all(
        &self,
        id: &RoleId,
        required: &BTreeSet<Permission>,
    ) -> Result<u64, StoreError> {
        (**self).count_with_all(id, required).await
    }

    async fn add_to_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        (**self).add_to_set(id, permissions).await
    }

    async fn remove_from_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        (**self).remove_from_set(id, permissions).await
    }

    async fn replace_permissions(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        (**self).replace_permissions(id, permissions).await
    }
}

#[async_trait::async_trait]
impl<U> UserRepository for Arc<U>
where
    U: UserRepository + ?Sized,
{
    async fn find_role_id(&self, user_id: &UserId) -> Result<Option<RoleId>, StoreError> {
        (**self).find_role_id(user_id).await
    }

    async fn set_role_id(&self, user_id: &UserId, role_id: Option<&RoleId>) -> Result<(), StoreError> {
        (**self).set_role_id(user_id, role_id).await
    }
}
