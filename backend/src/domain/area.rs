//! Organisational area model.
//!
//! Areas hold, review, and route documents. The intake desk (Mesa de Partes)
//! is an ordinary area by convention; nothing in the model special-cases it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised by the area newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaValidationError {
    EmptyName,
    NameTooLong { max: usize },
    EmptyCode,
    CodeTooShort { min: usize },
    CodeTooLong { max: usize },
    CodeInvalidCharacters,
}

impl fmt::Display for AreaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "area name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "area name must be at most {max} characters")
            }
            Self::EmptyCode => write!(f, "area code must not be empty"),
            Self::CodeTooShort { min } => {
                write!(f, "area code must be at least {min} characters")
            }
            Self::CodeTooLong { max } => {
                write!(f, "area code must be at most {max} characters")
            }
            Self::CodeInvalidCharacters => {
                write!(f, "area code may only contain letters and digits")
            }
        }
    }
}

impl std::error::Error for AreaValidationError {}

/// Stable area identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(Uuid);

impl AreaId {
    /// Generate a new random [`AreaId`].
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

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human readable area name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaName(String);

/// Maximum allowed length for an area name.
pub const AREA_NAME_MAX: usize = 120;

impl AreaName {
    /// Validate and construct an [`AreaName`], trimming surrounding
    /// whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, AreaValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AreaValidationError::EmptyName);
        }
        if trimmed.chars().count() > AREA_NAME_MAX {
            return Err(AreaValidationError::NameTooLong { max: AREA_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for AreaName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<AreaName> for String {
    fn from(value: AreaName) -> Self {
        value.0
    }
}

/// Short uppercase routing code shown on printed cargos and inbox listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaCode(String);

/// Minimum allowed length for an area code.
pub const AREA_CODE_MIN: usize = 2;
/// Maximum allowed length for an area code.
pub const AREA_CODE_MAX: usize = 10;

impl AreaCode {
    /// Validate and construct an [`AreaCode`], upper-casing the input.
    pub fn new(code: impl Into<String>) -> Result<Self, AreaValidationError> {
        let code = code.into();
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(AreaValidationError::EmptyCode);
        }
        let length = normalized.chars().count();
        if length < AREA_CODE_MIN {
            return Err(AreaValidationError::CodeTooShort { min: AREA_CODE_MIN });
        }
        if length > AREA_CODE_MAX {
            return Err(AreaValidationError::CodeTooLong { max: AREA_CODE_MAX });
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AreaValidationError::CodeInvalidCharacters);
        }
        Ok(Self(normalized))
    }
}

impl AsRef<str> for AreaCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<AreaCode> for String {
    fn from(value: AreaCode) -> Self {
        value.0
    }
}

/// Organisational unit able to hold and route documents.
///
/// ## Invariants
/// - `name` is non-empty once trimmed.
/// - `code` is uppercase alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    id: AreaId,
    name: AreaName,
    code: AreaCode,
    active: bool,
    created_at: DateTime<Utc>,
}

impl Area {
    /// Build an [`Area`] from validated components.
    pub fn new(
        id: AreaId,
        name: AreaName,
        code: AreaCode,
        active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            code,
            active,
            created_at,
        }
    }

    /// Stable area identifier.
    pub fn id(&self) -> AreaId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &AreaName {
        &self.name
    }

    /// Short routing code.
    pub fn code(&self) -> &AreaCode {
        &self.code
    }

    /// Whether the area currently accepts documents.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Provisioning timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", AreaValidationError::EmptyName)]
    #[case("   ", AreaValidationError::EmptyName)]
    fn name_rejects_blank_input(#[case] input: &str, #[case] expected: AreaValidationError) {
        let err = AreaName::new(input).expect_err("blank names must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn name_rejects_overlong_input() {
        let err = AreaName::new("a".repeat(AREA_NAME_MAX + 1)).expect_err("overlong name");
        assert_eq!(err, AreaValidationError::NameTooLong { max: AREA_NAME_MAX });
    }

    #[rstest]
    fn name_trims_surrounding_whitespace() {
        let name = AreaName::new("  Mesa de Partes  ").expect("valid name");
        assert_eq!(name.as_ref(), "Mesa de Partes");
    }

    #[rstest]
    #[case("mp", "MP")]
    #[case(" tox1 ", "TOX1")]
    #[case("BALIS", "BALIS")]
    fn code_uppercases_and_trims(#[case] input: &str, #[case] expected: &str) {
        let code = AreaCode::new(input).expect("valid code");
        assert_eq!(code.as_ref(), expected);
    }

    #[rstest]
    #[case("x", AreaValidationError::CodeTooShort { min: AREA_CODE_MIN })]
    #[case("ABCDEFGHIJK", AreaValidationError::CodeTooLong { max: AREA_CODE_MAX })]
    #[case("A-1", AreaValidationError::CodeInvalidCharacters)]
    #[case("", AreaValidationError::EmptyCode)]
    fn code_rejects_invalid_input(#[case] input: &str, #[case] expected: AreaValidationError) {
        let err = AreaCode::new(input).expect_err("invalid codes must fail");
        assert_eq!(err, expected);
    }
}
