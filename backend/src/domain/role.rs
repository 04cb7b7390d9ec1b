//! Role catalogue model.
//!
//! A role bundles an access level with a fixed [`CapabilitySet`]. Roles are
//! shared read-only by every user referencing them; capability changes only
//! happen through explicit administrative edits to the catalogue.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::permissions::CapabilitySet;

/// Validation errors raised by the role newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleValidationError {
    EmptyName,
    NameTooLong { max: usize },
}

impl fmt::Display for RoleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "role name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "role name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for RoleValidationError {}

/// Stable role identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Generate a new random [`RoleId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human readable role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleName(String);

/// Maximum allowed length for a role name.
pub const ROLE_NAME_MAX: usize = 60;

impl RoleName {
    /// Validate and construct a [`RoleName`], trimming surrounding
    /// whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, RoleValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RoleValidationError::EmptyName);
        }
        if trimmed.chars().count() > ROLE_NAME_MAX {
            return Err(RoleValidationError::NameTooLong { max: ROLE_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

/// Catalogue role granting a capability set at an ordinal access level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: RoleName,
    access_level: i16,
    capabilities: CapabilitySet,
}

impl Role {
    /// Build a [`Role`] from validated components.
    pub fn new(id: RoleId, name: RoleName, access_level: i16, capabilities: CapabilitySet) -> Self {
        Self {
            id,
            name,
            access_level,
            capabilities,
        }
    }

    /// Stable role identifier.
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    /// Ordinal access level; higher values outrank lower ones.
    pub fn access_level(&self) -> i16 {
        self.access_level
    }

    /// Capabilities granted to users holding this role.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::permissions::Capability;
    use rstest::rstest;

    #[rstest]
    fn name_rejects_blank_and_overlong_input() {
        assert_eq!(
            RoleName::new("  ").expect_err("blank"),
            RoleValidationError::EmptyName
        );
        assert_eq!(
            RoleName::new("x".repeat(ROLE_NAME_MAX + 1)).expect_err("overlong"),
            RoleValidationError::NameTooLong { max: ROLE_NAME_MAX }
        );
    }

    #[rstest]
    fn role_exposes_its_capability_set() {
        let capabilities =
            CapabilitySet::from_iter([Capability::CreateDocuments, Capability::EditDocuments]);
        let role = Role::new(
            RoleId::random(),
            RoleName::new("Mesa de Partes").expect("valid name"),
            1,
            capabilities,
        );
        assert!(role.capabilities().contains(Capability::CreateDocuments));
        assert!(!role.capabilities().contains(Capability::ManageDirectory));
    }
}
