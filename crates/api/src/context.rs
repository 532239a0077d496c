use rolekit_core::UserId;

/// Principal context for a request (the authenticated user).
///
/// Only identity lives here. The user's role is resolved per check, so a
/// role change applies to the very next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
}

impl PrincipalContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn is(&self, other: &UserId) -> bool {
        &self.user_id == other
    }
}
