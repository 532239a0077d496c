use thiserror::Error;

use rolekit_core::{DomainError, RoleId};

use crate::Permission;
use crate::store::StoreError;

/// Error surfaced by every authorization operation.
///
/// The first three kinds are deterministic logic outcomes and are never
/// retried; `Storage` is an infrastructure failure passed through untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("role does not exist: {0}")]
    NotFound(RoleId),

    #[error("forbidden: missing permissions [{}]", join(.missing))]
    Forbidden { missing: Vec<Permission> },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthzError {
    /// Stable machine-readable code (used in HTTP error bodies).
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::InvalidArgument(_) => "invalid_argument",
            AuthzError::NotFound(_) => "not_found",
            AuthzError::Forbidden { .. } => "forbidden",
            AuthzError::Storage(_) => "storage_error",
        }
    }
}

impl From<DomainError> for AuthzError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidArgument(msg) | DomainError::InvalidId(msg) => {
                AuthzError::InvalidArgument(msg)
            }
        }
    }
}

fn join(perms: &[Permission]) -> String {
    perms.iter().map(Permission::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        let forbidden = AuthzError::Forbidden {
            missing: vec![Permission::new("other")],
        };
        let invalid: AuthzError = DomainError::invalid_argument("bad").into();
        let missing_role = AuthzError::NotFound(RoleId::parse("nope").unwrap());
        let storage: AuthzError = StoreError::Unavailable("down".into()).into();

        assert_eq!(forbidden.kind(), "forbidden");
        assert_eq!(invalid.kind(), "invalid_argument");
        assert_eq!(missing_role.kind(), "not_found");
        assert_eq!(storage.kind(), "storage_error");
    }

    #[test]
    fn forbidden_lists_missing_permissions() {
        let err = AuthzError::Forbidden {
            missing: vec![Permission::new("a"), Permission::new("b")],
        };
        assert_eq!(err.to_string(), "forbidden: missing permissions [a, b]");
    }
}
