use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use rolekit_core::RoleId;

use crate::Permission;

/// Role document: a named bundle of permissions.
///
/// `name` is a label only; nothing enforces uniqueness. `id` never changes
/// once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, permissions: BTreeSet<Permission>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions,
        }
    }

    /// True iff `required` is non-empty and every token is held.
    pub fn grants_all(&self, required: &BTreeSet<Permission>) -> bool {
        !required.is_empty() && required.is_subset(&self.permissions)
    }

    /// Required tokens this role does not hold.
    pub fn missing(&self, required: &BTreeSet<Permission>) -> Vec<Permission> {
        required.difference(&self.permissions).cloned().collect()
    }
}
