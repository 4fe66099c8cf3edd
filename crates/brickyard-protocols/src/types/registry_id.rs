//! Registry identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidRegistryId;

/// Scope used for inline definitions resolved out of a mod document.
pub const INTERNAL_SCOPE: &str = "@internal";

/// Scope of the bricks shipped with the runtime.
pub const BUILTIN_SCOPE: &str = "@brickyard";

/// A namespaced identifier for a brick, mod or integration definition.
///
/// Accepted forms: `name`, `scope/name`, `@scope/name` and
/// `@scope/collection/name`. Segments use lowercase letters, digits and `-._~`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryId(String);

impl RegistryId {
    /// Parse and validate a registry id.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidRegistryId> {
        let value = value.into();
        validate(&value)?;
        Ok(Self(value))
    }

    /// Build the id of an inline definition from its content hash.
    pub fn internal(hash: &str) -> Self {
        Self(format!("{INTERNAL_SCOPE}/{}", hash.to_ascii_lowercase()))
    }

    /// Id of a brick shipped with the runtime. `name` must be a valid segment.
    pub fn builtin(name: &str) -> Self {
        Self(format!("{BUILTIN_SCOPE}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `@scope` prefix, if any.
    pub fn scope(&self) -> Option<&str> {
        if self.0.starts_with('@') {
            self.0.split('/').next()
        } else {
            None
        }
    }

    /// Whether this id was generated for an inline definition.
    pub fn is_internal(&self) -> bool {
        self.scope() == Some(INTERNAL_SCOPE)
    }
}

fn validate(value: &str) -> Result<(), InvalidRegistryId> {
    let fail = |reason: String| InvalidRegistryId {
        id: value.to_string(),
        reason,
    };

    if value.is_empty() {
        return Err(fail("id is empty".to_string()));
    }

    let body = value.strip_prefix('@').unwrap_or(value);
    let segments: Vec<&str> = body.split('/').collect();
    if segments.len() > 3 {
        return Err(fail("too many path segments".to_string()));
    }
    if value.starts_with('@') && segments.len() < 2 {
        return Err(fail("scoped id must include a name".to_string()));
    }

    for segment in segments {
        let Some(first) = segment.chars().next() else {
            return Err(fail("empty path segment".to_string()));
        };
        if first == '.' || first == '_' {
            return Err(fail(format!("segment '{segment}' must not start with '{first}'")));
        }
        if let Some(bad) = segment
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || "-._~".contains(*c)))
        {
            return Err(fail(format!("invalid character '{bad}'")));
        }
    }

    Ok(())
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegistryId {
    type Err = InvalidRegistryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RegistryId {
    type Error = InvalidRegistryId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegistryId> for String {
    fn from(id: RegistryId) -> Self {
        id.0
    }
}

impl AsRef<str> for RegistryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
