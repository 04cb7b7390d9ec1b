//! User data model.
//!
//! Users belong to exactly one home area and hold one catalogue role; the
//! role relation carries the capability grants. Accounts are never deleted,
//! only deactivated.

use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::domain::area::AreaId;
use crate::domain::role::RoleId;

/// Validation errors returned by the user newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyUsername,
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmptyFullName,
    FullNameTooLong { max: usize },
    FullNameInvalidCharacters,
    EmptyGrade,
    GradeTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooShort { min } => {
                write!(f, "username must be at least {min} characters")
            }
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain lowercase letters, digits, dots, hyphens, or underscores",
            ),
            Self::EmptyFullName => write!(f, "full name must not be empty"),
            Self::FullNameTooLong { max } => {
                write!(f, "full name must be at most {max} characters")
            }
            Self::FullNameInvalidCharacters => write!(
                f,
                "full name may only contain letters, spaces, apostrophes, dots, or hyphens",
            ),
            Self::EmptyGrade => write!(f, "grade must not be empty"),
            Self::GradeTooLong { max } => {
                write!(f, "grade must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
///
/// Keeps the original string form alongside the parsed UUID because session
/// cookies persist the identifier as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    /// Wrap an existing UUID without a round-trip through strings.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Login name, normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[a-z0-9._-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

impl Username {
    /// Validate and construct a [`Username`]; input is trimmed and
    /// lower-cased so lookups are case-insensitive.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        let normalized = username.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = normalized.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&normalized) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(normalized))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Full legal name shown on cargos and audit entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

/// Maximum allowed length for a full name.
pub const FULL_NAME_MAX: usize = 120;

static FULL_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn full_name_regex() -> &'static Regex {
    FULL_NAME_RE.get_or_init(|| {
        // Unicode letters and combining marks; institutional names carry
        // accents and apostrophes.
        let pattern = r"^[\p{L}\p{M}' .-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("full name regex failed to compile: {error}"))
    })
}

impl FullName {
    /// Validate and construct a [`FullName`], trimming surrounding
    /// whitespace.
    pub fn new(full_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let full_name = full_name.into();
        let trimmed = full_name.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }
        if trimmed.chars().count() > FULL_NAME_MAX {
            return Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX });
        }
        if !full_name_regex().is_match(trimmed) {
            return Err(UserValidationError::FullNameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

/// Grade or rank line printed under the officer's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade(String);

/// Maximum allowed length for a grade.
pub const GRADE_MAX: usize = 60;

impl Grade {
    /// Validate and construct a [`Grade`], trimming surrounding whitespace.
    pub fn new(grade: impl Into<String>) -> Result<Self, UserValidationError> {
        let grade = grade.into();
        let trimmed = grade.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyGrade);
        }
        if trimmed.chars().count() > GRADE_MAX {
            return Err(UserValidationError::GradeTooLong { max: GRADE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Grade {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Grade> for String {
    fn from(value: Grade) -> Self {
        value.0
    }
}

/// Fields required to assemble a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub username: Username,
    pub full_name: FullName,
    pub grade: Option<Grade>,
    pub role_id: RoleId,
    pub home_area_id: AreaId,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application user account.
///
/// ## Invariants
/// - `username` is lowercase and unique within the directory.
/// - Accounts are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    full_name: FullName,
    grade: Option<Grade>,
    role_id: RoleId,
    home_area_id: AreaId,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Build a [`User`] from validated components.
    pub fn new(draft: UserDraft) -> Self {
        let UserDraft {
            id,
            username,
            full_name,
            grade,
            role_id,
            home_area_id,
            active,
            created_at,
            updated_at,
        } = draft;
        Self {
            id,
            username,
            full_name,
            grade,
            role_id,
            home_area_id,
            active,
            created_at,
            updated_at,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Lowercase login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Full legal name.
    pub fn full_name(&self) -> &FullName {
        &self.full_name
    }

    /// Grade or rank, when recorded.
    pub fn grade(&self) -> Option<&Grade> {
        self.grade.as_ref()
    }

    /// Catalogue role granting this user's capabilities.
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Area the user acts for.
    pub fn home_area_id(&self) -> AreaId {
        self.home_area_id
    }

    /// Whether the account can authenticate and act.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Provisioning timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last administrative mutation timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Copy of the user with administrative fields replaced.
    pub(crate) fn with_profile(
        &self,
        full_name: FullName,
        grade: Option<Grade>,
        role_id: RoleId,
        home_area_id: AreaId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            full_name,
            grade,
            role_id,
            home_area_id,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Copy of the user with the active flag cleared.
    pub(crate) fn deactivated(&self, now: DateTime<Utc>) -> Self {
        Self {
            active: false,
            updated_at: now,
            ..self.clone()
        }
    }
}
