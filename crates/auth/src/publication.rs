//! Snapshot queries that let a client know its own role and permissions.
//!
//! These are plain reads; clients that want live updates follow them with
//! the change stream and re-read on each relevant event.

use serde::Serialize;

use rolekit_core::{RoleId, UserId};

use crate::{AuthorizationService, AuthzError, Role};

/// What a signed-in user is allowed to see about their own role.
///
/// `ready` without data is the normal answer for anonymous callers and for
/// users without a role; it is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRolePublication {
    pub ready: bool,
    pub user_id: Option<UserId>,
    pub role_id: Option<RoleId>,
    pub role: Option<Role>,
}

impl UserRolePublication {
    pub fn empty() -> Self {
        Self {
            ready: true,
            user_id: None,
            role_id: None,
            role: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.role_id.is_none() && self.role.is_none()
    }
}

impl AuthorizationService {
    /// A single role document.
    pub async fn publish_role(&self, role_id: &RoleId) -> Result<Option<Role>, AuthzError> {
        self.roles().get_role(Some(role_id)).await
    }

    /// Every role document.
    pub async fn publish_roles(&self) -> Result<Vec<Role>, AuthzError> {
        self.roles().list_roles().await
    }

    /// The caller's `role_id` field plus the matching role document.
    pub async fn publish_user_role(
        &self,
        user_id: Option<&UserId>,
    ) -> Result<UserRolePublication, AuthzError> {
        let Some(user_id) = user_id else {
            return Ok(UserRolePublication::empty());
        };
        let Some(role_id) = self.users().get_user_role_id(user_id).await? else {
            return Ok(UserRolePublication::empty());
        };

        let role = self.roles().get_role(Some(&role_id)).await?;
        Ok(UserRolePublication {
            ready: true,
            user_id: Some(user_id.clone()),
            role_id: Some(role_id),
            role,
        })
    }
}
