//! Opaque identifiers for roles and users.
//!
//! Both are string keys: role ids are minted here (UUIDv7 text), user ids
//! come from whatever identity provider authenticated the caller.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a role record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

/// Identifier of a user account (actor identity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Mint a fresh identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer explicit ids in tests for
            /// readable assertions.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Parse an identifier, rejecting empty or blank input.
            pub fn parse(s: impl Into<String>) -> Result<Self, DomainError> {
                let s = s.into();
                if s.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{} must not be empty", $name)));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_id!(RoleId, "RoleId");
impl_string_id!(UserId, "UserId");

/// Parse an optional wire value into an optional role id.
///
/// `None` and blank strings both mean "no role", mirroring how an unset
/// field is read back from the document store.
pub fn optional_role_id(raw: Option<&str>) -> Option<RoleId> {
    raw.and_then(|s| RoleId::parse(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        assert!(matches!(RoleId::parse(""), Err(DomainError::InvalidId(_))));
        assert!(matches!(UserId::parse("   "), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn generated_ids_are_unique_and_parse_back() {
        let a = RoleId::generate();
        let b = RoleId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().parse::<RoleId>().unwrap(), a);
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id = UserId::parse("user-1").unwrap();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("user-1"));

        let back: UserId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);

        let err = serde_json::from_value::<RoleId>(serde_json::json!(""));
        assert!(err.is_err());
    }

    #[test]
    fn optional_role_id_treats_blank_as_absent() {
        assert_eq!(optional_role_id(None), None);
        assert_eq!(optional_role_id(Some("")), None);
        assert_eq!(optional_role_id(Some("r1")), Some(RoleId::parse("r1").unwrap()));
    }
}
