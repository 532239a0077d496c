//! User → role assignment.

use std::sync::Arc;

use tracing::info;

use rolekit_core::{RoleId, UserId};
use rolekit_events::{EventSink, RbacEvent};

use crate::store::UserRepository;
use crate::{AuthzError, RoleStore};

/// Maps each user to at most one role.
///
/// Holds role ids by reference only; a role deleted after assignment simply
/// stops granting anything.
pub struct UserRoleIndex {
    users: Arc<dyn UserRepository>,
    roles: Arc<RoleStore>,
    events: Arc<dyn EventSink>,
}

impl UserRoleIndex {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<RoleStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { users, roles, events }
    }

    /// The user's role id, or `None` for an unknown user or one without a role.
    pub async fn get_user_role_id(&self, user_id: &UserId) -> Result<Option<RoleId>, AuthzError> {
        Ok(self.users.find_role_id(user_id).await?)
    }

    /// Assign `role_id` to the user, or clear the assignment with `None`.
    ///
    /// Assigning a role that does not exist fails with `NotFound` and leaves
    /// the current assignment untouched.
    pub async fn set_user_role(
        &self,
        user_id: &UserId,
        role_id: Option<&RoleId>,
    ) -> Result<(), AuthzError> {
        if let Some(role_id) = role_id {
            if !self.roles.role_exists(Some(role_id)).await? {
                return Err(AuthzError::NotFound(role_id.clone()));
            }
        }

        self.users.set_role_id(user_id, role_id).await?;

        match role_id {
            Some(r) => info!(user_id = %user_id, role_id = %r, "user role assigned"),
            None => info!(user_id = %user_id, "user role cleared"),
        }
        self.events.emit(RbacEvent::UserRoleChanged {
            user_id: user_id.clone(),
            role_id: role_id.cloned(),
        });
        Ok(())
    }
}
