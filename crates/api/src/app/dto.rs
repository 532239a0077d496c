use serde::{Deserialize, Serialize};

use rolekit_auth::{Permissions, Role};
use rolekit_core::{RoleId, UserId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default = "no_permissions")]
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionOp {
    Add,
    Remove,
    Set,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    pub op: PermissionOp,
    pub permissions: Permissions,
}

/// `role_id: null`, `""` or an omitted field clears the assignment.
#[derive(Debug, Deserialize)]
pub struct SetUserRoleRequest {
    #[serde(default)]
    pub role_id: Option<String>,
}

/// Check either a user (the caller by default) or a role directly.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub permissions: Permissions,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
}

fn no_permissions() -> Permissions {
    Permissions::Many(Vec::new())
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub user_id: UserId,
    pub role_id: Option<RoleId>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
