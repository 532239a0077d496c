//! API-side permission guard.
//!
//! Handlers call [`require`] before touching the store. The decision itself
//! always goes through the shared [`AuthorizationService`], so HTTP callers
//! get exactly the semantics in-process callers get.

use rolekit_auth::{AuthorizationService, AuthzError, Permissions};

use crate::context::PrincipalContext;

pub const ROLES_READ: &str = "roles.read";
pub const ROLES_MANAGE: &str = "roles.manage";
pub const USERS_READ: &str = "users.read";
pub const USERS_MANAGE: &str = "users.manage";

/// Permissions held by the bootstrap administrator role.
pub const ADMIN_PERMISSIONS: [&str; 4] = [ROLES_READ, ROLES_MANAGE, USERS_READ, USERS_MANAGE];

/// `Forbidden` unless the caller's role grants `permission`.
pub async fn require(
    authz: &AuthorizationService,
    principal: &PrincipalContext,
    permission: &'static str,
) -> Result<(), AuthzError> {
    authz
        .check_user_perms(&Permissions::single(permission), Some(principal.user_id()))
        .await
}
