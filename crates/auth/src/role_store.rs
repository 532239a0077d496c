//! Role records and their permission sets.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use rolekit_core::{DomainError, RoleId};
use rolekit_events::{EventSink, RbacEvent};

use crate::permissions::to_strings;
use crate::store::RoleRepository;
use crate::{AuthzError, Permission, Permissions, Role};

/// Owns role documents and answers permission/existence queries.
///
/// Queries never fail for a merely negative answer: an unknown role has no
/// permissions and can do nothing.
pub struct RoleStore {
    repo: Arc<dyn RoleRepository>,
    events: Arc<dyn EventSink>,
}

impl RoleStore {
    pub fn new(repo: Arc<dyn RoleRepository>, events: Arc<dyn EventSink>) -> Self {
        Self { repo, events }
    }

    /// True iff exactly one role has this id. `None` is always false.
    pub async fn role_exists(&self, role_id: Option<&RoleId>) -> Result<bool, AuthzError> {
        let Some(role_id) = role_id else {
            return Ok(false);
        };
        Ok(self.repo.count(role_id).await? == 1)
    }

    /// The role's permissions, or the empty set for an unknown/absent role.
    pub async fn get_permissions(
        &self,
        role_id: Option<&RoleId>,
    ) -> Result<BTreeSet<Permission>, AuthzError> {
        Ok(self
            .get_role(role_id)
            .await?
            .map(|r| r.permissions)
            .unwrap_or_default())
    }

    /// Does the role hold *all* of `requested`?
    ///
    /// An empty requirement (`""` or `[]`) is denied here. Callers that want
    /// "require nothing" to pass go through the user-level check instead.
    pub async fn role_can(
        &self,
        requested: &Permissions,
        role_id: Option<&RoleId>,
    ) -> Result<bool, AuthzError> {
        self.role_can_all(&requested.normalize(), role_id).await
    }

    pub(crate) async fn role_can_all(
        &self,
        required: &BTreeSet<Permission>,
        role_id: Option<&RoleId>,
    ) -> Result<bool, AuthzError> {
        let Some(role_id) = role_id else {
            return Ok(false);
        };
        if required.is_empty() {
            return Ok(false);
        }
        Ok(self.repo.count_with_all(role_id, required).await? > 0)
    }

    /// Set-union the requested permissions into the role.
    ///
    /// Returns the updated role, or `None` when the role does not exist.
    /// Adding nothing (`""` or `[]`) writes nothing and emits no event.
    pub async fn add_permissions(
        &self,
        requested: &Permissions,
        role_id: &RoleId,
    ) -> Result<Option<Role>, AuthzError> {
        let add = requested.normalize();
        if add.is_empty() {
            debug!(role_id = %role_id, op = "add", "empty permission update skipped");
            return self.get_role(Some(role_id)).await;
        }
        let updated = self.repo.add_to_set(role_id, &add).await?;
        self.after_permissions_write("add", role_id, &updated);
        Ok(updated)
    }

    /// Remove the requested permissions; non-members are ignored.
    ///
    /// An empty request is a no-op: nothing is written and no change event
    /// is emitted. The current document is returned as-is.
    pub async fn remove_permissions(
        &self,
        requested: &Permissions,
        role_id: &RoleId,
    ) -> Result<Option<Role>, AuthzError> {
        let remove = requested.normalize();
        if remove.is_empty() {
            debug!(role_id = %role_id, op = "remove", "empty permission update skipped");
            return self.get_role(Some(role_id)).await;
        }
        let updated = self.repo.remove_from_set(role_id, &remove).await?;
        self.after_permissions_write("remove", role_id, &updated);
        Ok(updated)
    }

    /// Replace the whole permission set (overwrite, not merge).
    ///
    /// Concurrent replaces race with last-write-wins.
    pub async fn set_permissions(
        &self,
        permissions: &Permissions,
        role_id: &RoleId,
    ) -> Result<Option<Role>, AuthzError> {
        let set = permissions.require_collection()?;
        let updated = self.repo.replace_permissions(role_id, &set).await?;
        self.after_permissions_write("set", role_id, &updated);
        Ok(updated)
    }

    pub async fn create_role(
        &self,
        name: &str,
        permissions: &Permissions,
    ) -> Result<Role, AuthzError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("role name must not be empty").into());
        }

        let role = Role::new(RoleId::generate(), name, permissions.normalize());
        self.repo.insert(role.clone()).await?;

        info!(role_id = %role.id, name = %role.name, "role created");
        self.events.emit(RbacEvent::RoleCreated {
            role_id: role.id.clone(),
            name: role.name.clone(),
            permissions: to_strings(&role.permissions),
        });
        Ok(role)
    }

    /// Delete a role. User references to it are left in place and resolve
    /// to "no role" from then on.
    pub async fn delete_role(&self, role_id: &RoleId) -> Result<bool, AuthzError> {
        let removed = self.repo.delete(role_id).await?;
        if removed {
            info!(role_id = %role_id, "role deleted");
            self.events.emit(RbacEvent::RoleDeleted {
                role_id: role_id.clone(),
            });
        }
        Ok(removed)
    }

    pub async fn get_role(&self, role_id: Option<&RoleId>) -> Result<Option<Role>, AuthzError> {
        match role_id {
            Some(id) => Ok(self.repo.find(id).await?),
            None => Ok(None),
        }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AuthzError> {
        Ok(self.repo.list().await?)
    }

    fn after_permissions_write(&self, op: &'static str, role_id: &RoleId, updated: &Option<Role>) {
        match updated {
            Some(role) => {
                info!(role_id = %role_id, op, count = role.permissions.len(), "role permissions updated");
                self.events.emit(RbacEvent::RolePermissionsChanged {
                    role_id: role_id.clone(),
                    permissions: to_strings(&role.permissions),
                });
            }
            None => debug!(role_id = %role_id, op, "permission update matched no role"),
        }
    }
}
