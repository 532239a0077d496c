use serde::{Deserialize, Serialize};

use rolekit_core::{RoleId, UserId};

/// A fact about a completed RBAC write.
///
/// Permission sets are carried as they were *after* the write so consumers
/// never need to read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RbacEvent {
    RoleCreated {
        role_id: RoleId,
        name: String,
        permissions: Vec<String>,
    },
    RoleDeleted {
        role_id: RoleId,
    },
    RolePermissionsChanged {
        role_id: RoleId,
        permissions: Vec<String>,
    },
    UserRoleChanged {
        user_id: UserId,
        role_id: Option<RoleId>,
    },
}

impl RbacEvent {
    /// Stable event name (e.g. "rbac.role.created").
    pub fn event_type(&self) -> &'static str {
        match self {
            RbacEvent::RoleCreated { .. } => "rbac.role.created",
            RbacEvent::RoleDeleted { .. } => "rbac.role.deleted",
            RbacEvent::RolePermissionsChanged { .. } => "rbac.role.permissions_changed",
            RbacEvent::UserRoleChanged { .. } => "rbac.user.role_changed",
        }
    }

    /// The user this event is private to, if any.
    ///
    /// Role events are visible to every subscriber; an assignment change is
    /// only relayed to the user it concerns.
    pub fn audience(&self) -> Option<&UserId> {
        match self {
            RbacEvent::UserRoleChanged { user_id, .. } => Some(user_id),
            _ => None,
        }
    }
}
