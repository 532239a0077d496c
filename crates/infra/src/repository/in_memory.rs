use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use rolekit_auth::{Permission, Role, RoleRepository, StoreError, UserRepository};
use rolekit_core::{RoleId, UserId};

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// In-memory roles collection for tests/dev.
///
/// Each set update holds the write lock for the whole mutation, which gives
/// the same per-document atomicity a real store provides.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    inner: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, id: &RoleId, f: F) -> Result<Option<Role>, StoreError>
    where
        F: FnOnce(&mut BTreeSet<Permission>),
    {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.get_mut(id).map(|role| {
            f(&mut role.permissions);
            role.clone()
        }))
    }
}

#[async_trait::async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn insert(&self, role: Role) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&role.id) {
            return Err(StoreError::Duplicate(role.id.to_string()));
        }
        map.insert(role.id.clone(), role);
        Ok(())
    }

    async fn delete(&self, id: &RoleId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(id).is_some())
    }

    async fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Role>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut roles: Vec<Role> = map.values().cloned().collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roles)
    }

    async fn count(&self, id: &RoleId) -> Result<u64, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(u64::from(map.contains_key(id)))
    }

    async fn count_with_all(
        &self,
        id: &RoleId,
        required: &BTreeSet<Permission>,
    ) -> Result<u64, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(u64::from(
            map.get(id)
                .is_some_and(|role| required.is_subset(&role.permissions)),
        ))
    }

    async fn add_to_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        self.update(id, |set| set.extend(permissions.iter().cloned()))
    }

    async fn remove_from_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        self.update(id, |set| set.retain(|p| !permissions.contains(p)))
    }

    async fn replace_permissions(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        self.update(id, |set| *set = permissions.clone())
    }
}

/// In-memory users collection (only the `role_id` field).
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<HashMap<UserId, Option<RoleId>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_role_id(&self, user_id: &UserId) -> Result<Option<RoleId>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(user_id).cloned().flatten())
    }

    async fn set_role_id(&self, user_id: &UserId, role_id: Option<&RoleId>) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(user_id.clone(), role_id.cloned());
        Ok(())
    }
}
