use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use rolekit_core::{RoleId, UserId};
use rolekit_events::EventSink;

use crate::permissions::to_strings;
use crate::store::{RoleRepository, UserRepository};
use crate::{AuthzError, Permission, Permissions, Role, RoleStore, UserRoleIndex};

/// Single entry point for access-control decisions.
///
/// The acting user is always passed in explicitly. `None` means the caller
/// has no authenticated identity (console jobs, background tasks) and is
/// treated as a user without a role.
pub struct AuthorizationService {
    roles: Arc<RoleStore>,
    users: Arc<UserRoleIndex>,
}

/// Why a user check came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub allowed: bool,
    pub user_id: Option<UserId>,
    pub role_id: Option<RoleId>,
    pub required: Vec<String>,
    pub missing: Vec<String>,
    pub reason: String,
}

impl AuthorizationService {
    pub fn new(roles: Arc<RoleStore>, users: Arc<UserRoleIndex>) -> Self {
        Self { roles, users }
    }

    /// Wire the three components over a pair of repositories.
    ///
    /// Built once at process start and shared; there is no global handle.
    pub fn from_repositories(
        roles: Arc<dyn RoleRepository>,
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let role_store = Arc::new(RoleStore::new(roles, events.clone()));
        let index = Arc::new(UserRoleIndex::new(users, role_store.clone(), events));
        Self::new(role_store, index)
    }

    pub fn roles(&self) -> &RoleStore {
        &self.roles
    }

    pub fn users(&self) -> &UserRoleIndex {
        &self.users
    }

    /// Can this user do all of `requested`?
    ///
    /// An empty requirement is trivially satisfied at this level, whatever
    /// the user's role (unlike [`RoleStore::role_can`]).
    pub async fn user_can(
        &self,
        requested: &Permissions,
        user_id: Option<&UserId>,
    ) -> Result<bool, AuthzError> {
        let required = requested.normalize();
        if required.is_empty() {
            return Ok(true);
        }

        let role_id = self.resolve_role_id(user_id).await?;
        self.roles.role_can_all(&required, role_id.as_ref()).await
    }

    /// Enforcement gate: `Forbidden` unless [`Self::user_can`] passes.
    pub async fn check_user_perms(
        &self,
        requested: &Permissions,
        user_id: Option<&UserId>,
    ) -> Result<(), AuthzError> {
        let required = requested.normalize();
        if required.is_empty() {
            return Ok(());
        }

        // One read of the role decides both the outcome and `missing`.
        let role_id = self.resolve_role_id(user_id).await?;
        let missing = self.missing_for(&required, role_id.as_ref()).await?;
        if missing.is_empty() {
            return Ok(());
        }
        debug!(
            user_id = user_id.map(UserId::as_str),
            missing = ?missing,
            "user permission check denied"
        );
        Err(AuthzError::Forbidden { missing })
    }

    /// Enforcement gate against a role directly.
    ///
    /// Follows role-level semantics, so an empty requirement is rejected.
    pub async fn check_role_perms(
        &self,
        requested: &Permissions,
        role_id: Option<&RoleId>,
    ) -> Result<(), AuthzError> {
        let required = requested.normalize();
        let missing = self.missing_for(&required, role_id).await?;
        if !required.is_empty() && missing.is_empty() {
            return Ok(());
        }

        debug!(
            role_id = role_id.map(RoleId::as_str),
            missing = ?missing,
            "role permission check denied"
        );
        Err(AuthzError::Forbidden { missing })
    }

    /// The user's role document, or `None` when unassigned or dangling.
    pub async fn get_user_role(&self, user_id: &UserId) -> Result<Option<Role>, AuthzError> {
        let role_id = self.users.get_user_role_id(user_id).await?;
        self.roles.get_role(role_id.as_ref()).await
    }

    /// Same decision as [`Self::user_can`], with the reasoning spelled out.
    pub async fn explain_user_can(
        &self,
        requested: &Permissions,
        user_id: Option<&UserId>,
    ) -> Result<AuthorizationExplanation, AuthzError> {
        let required = requested.normalize();
        let role_id = self.resolve_role_id(user_id).await?;
        let mut explanation = AuthorizationExplanation {
            allowed: false,
            user_id: user_id.cloned(),
            role_id: role_id.clone(),
            required: to_strings(&required),
            missing: Vec::new(),
            reason: String::new(),
        };

        if required.is_empty() {
            explanation.allowed = true;
            explanation.reason = "nothing was required".to_string();
            return Ok(explanation);
        }

        let role = self.roles.get_role(role_id.as_ref()).await?;
        match (user_id, role_id.as_ref(), role) {
            (None, _, _) => {
                explanation.missing = explanation.required.clone();
                explanation.reason = "no authenticated user".to_string();
            }
            (Some(_), None, _) => {
                explanation.missing = explanation.required.clone();
                explanation.reason = "user has no role".to_string();
            }
            (Some(_), Some(id), None) => {
                explanation.missing = explanation.required.clone();
                explanation.reason = format!("assigned role '{id}' no longer exists");
            }
            (Some(_), Some(_), Some(role)) => {
                let missing = role.missing(&required);
                explanation.allowed = role.grants_all(&required);
                explanation.reason = if explanation.allowed {
                    format!("role '{}' grants every required permission", role.name)
                } else {
                    format!("role '{}' lacks {} required permission(s)", role.name, missing.len())
                };
                explanation.missing = missing.iter().map(|p| p.as_str().to_string()).collect();
            }
        }

        Ok(explanation)
    }

    async fn resolve_role_id(&self, user_id: Option<&UserId>) -> Result<Option<RoleId>, AuthzError> {
        match user_id {
            Some(user_id) => self.users.get_user_role_id(user_id).await,
            None => Ok(None),
        }
    }

    async fn missing_for(
        &self,
        required: &BTreeSet<Permission>,
        role_id: Option<&RoleId>,
    ) -> Result<Vec<Permission>, AuthzError> {
        let held = self.roles.get_permissions(role_id).await?;
        Ok(required.difference(&held).cloned().collect())
    }
}
