use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use rolekit_core::DomainError;

const SHAPE_ERROR: &str = "permissions must be a string or a collection of strings";

/// Permission token.
///
/// Permissions are opaque strings (e.g. "posts.create"); they are compared
/// by exact membership, never by prefix or pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A permission requirement as callers express it: one token or several.
///
/// Every operation normalizes this to a set first (see [`Permissions::normalize`]).
/// `Many` always means "all of these".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Permissions {
    Single(Permission),
    Many(Vec<Permission>),
}

impl Permissions {
    pub fn single(p: impl Into<Permission>) -> Self {
        Self::Single(p.into())
    }

    pub fn many<I, P>(iter: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self::Many(iter.into_iter().map(Into::into).collect())
    }

    /// Parse a dynamically-typed argument (request bodies, scripting glue).
    ///
    /// Accepts a JSON string or an array of strings; every other shape is an
    /// `InvalidArgument`, including arrays that contain a non-string.
    pub fn from_json(value: &JsonValue) -> Result<Self, DomainError> {
        match value {
            JsonValue::String(s) => Ok(Self::Single(Permission::new(s.clone()))),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(Permission::new(s.clone())),
                    _ => Err(DomainError::invalid_argument(SHAPE_ERROR)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            _ => Err(DomainError::invalid_argument(SHAPE_ERROR)),
        }
    }

    /// Collapse to the set of required tokens.
    ///
    /// A single empty string is the empty requirement. Inside a list an empty
    /// string is kept as a literal token, so `[""]` is only satisfied by a
    /// role that actually stores `""`.
    pub fn normalize(&self) -> BTreeSet<Permission> {
        match self {
            Self::Single(p) if p.is_empty() => BTreeSet::new(),
            Self::Single(p) => BTreeSet::from([p.clone()]),
            Self::Many(ps) => ps.iter().cloned().collect(),
        }
    }

    /// The list form, rejecting a single token.
    ///
    /// Used where a whole permission set is being supplied (full overwrite).
    pub fn require_collection(&self) -> Result<BTreeSet<Permission>, DomainError> {
        match self {
            Self::Many(ps) => Ok(ps.iter().cloned().collect()),
            Self::Single(_) => Err(DomainError::invalid_argument(
                "permissions must be a collection of strings",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Permissions::from_json(&value).map_err(serde::de::Error::custom)
    }
}

impl From<&'static str> for Permissions {
    fn from(value: &'static str) -> Self {
        Self::single(value)
    }
}

impl From<Vec<&'static str>> for Permissions {
    fn from(value: Vec<&'static str>) -> Self {
        Self::many(value)
    }
}

impl From<Permission> for Permissions {
    fn from(value: Permission) -> Self {
        Self::Single(value)
    }
}

/// Render a permission set as plain strings (wire/event form).
pub fn to_strings(set: &BTreeSet<Permission>) -> Vec<String> {
    set.iter().map(|p| p.as_str().to_string()).collect()
}
