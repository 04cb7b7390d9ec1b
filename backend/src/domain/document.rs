//! Document model and lifecycle states.
//!
//! A document enters the system at an intake area, moves between areas
//! through derivations, and ends in a terminal state. The `version` field
//! backs optimistic concurrency control: every committed transition
//! increments it, and stores refuse commits whose expected version is stale.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::area::AreaId;
use crate::domain::user::UserId;

/// Validation errors raised by the document newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    EmptyCode,
    CodeTooShort { min: usize },
    CodeTooLong { max: usize },
    CodeInvalidCharacters,
    EmptySubject,
    SubjectTooLong { max: usize },
}

impl fmt::Display for DocumentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "document code must not be empty"),
            Self::CodeTooShort { min } => {
                write!(f, "document code must be at least {min} characters")
            }
            Self::CodeTooLong { max } => {
                write!(f, "document code must be at most {max} characters")
            }
            Self::CodeInvalidCharacters => write!(
                f,
                "document code may only contain letters, digits, or hyphens",
            ),
            Self::EmptySubject => write!(f, "subject must not be empty"),
            Self::SubjectTooLong { max } => {
                write!(f, "subject must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for DocumentValidationError {}

/// Stable document identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a new random [`DocumentId`].
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

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Registered at the intake area; not yet picked up.
    Received,
    /// Being reviewed by the holding area.
    InReview,
    /// A pending derivation is awaiting the destination area's decision.
    Derived,
    /// Processing finished; terminal.
    Closed,
    /// Discarded without completion; terminal.
    Rejected,
}

impl DocumentStatus {
    /// Stable machine-readable name used in storage and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::InReview => "in_review",
            Self::Derived => "derived",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    /// Terminal statuses admit no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document status: {0}")]
pub struct ParseDocumentStatusError(String);

impl FromStr for DocumentStatus {
    type Err = ParseDocumentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "in_review" => Ok(Self::InReview),
            "derived" => Ok(Self::Derived),
            "closed" => Ok(Self::Closed),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseDocumentStatusError(other.to_owned())),
        }
    }
}

/// Kind of document moving through the workflow.
///
/// Toxicology case files enter the same workflow as any other document; the
/// kind only affects presentation and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Oficio: formal inter-office communication.
    Official,
    /// Informe: expert or status report.
    Report,
    /// Solicitud: request raised by an external party.
    Request,
    /// Toxicology case file.
    ToxicologyCase,
}

impl DocumentKind {
    /// Stable machine-readable name used in storage and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Report => "report",
            Self::Request => "request",
            Self::ToxicologyCase => "toxicology_case",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document kind: {0}")]
pub struct ParseDocumentKindError(String);

impl FromStr for DocumentKind {
    type Err = ParseDocumentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "official" => Ok(Self::Official),
            "report" => Ok(Self::Report),
            "request" => Ok(Self::Request),
            "toxicology_case" => Ok(Self::ToxicologyCase),
            other => Err(ParseDocumentKindError(other.to_owned())),
        }
    }
}

/// Human tracking code stamped on the physical document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentCode(String);

/// Minimum allowed length for a document code.
pub const DOCUMENT_CODE_MIN: usize = 4;
/// Maximum allowed length for a document code.
pub const DOCUMENT_CODE_MAX: usize = 24;

impl DocumentCode {
    /// Validate and construct a [`DocumentCode`], upper-casing the input.
    pub fn new(code: impl Into<String>) -> Result<Self, DocumentValidationError> {
        let code = code.into();
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(DocumentValidationError::EmptyCode);
        }
        let length = normalized.chars().count();
        if length < DOCUMENT_CODE_MIN {
            return Err(DocumentValidationError::CodeTooShort {
                min: DOCUMENT_CODE_MIN,
            });
        }
        if length > DOCUMENT_CODE_MAX {
            return Err(DocumentValidationError::CodeTooLong {
                max: DOCUMENT_CODE_MAX,
            });
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(DocumentValidationError::CodeInvalidCharacters);
        }
        Ok(Self(normalized))
    }
}

impl AsRef<str> for DocumentCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DocumentCode> for String {
    fn from(value: DocumentCode) -> Self {
        value.0
    }
}

/// Subject line describing what the document is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(String);

/// Maximum allowed length for a subject line.
pub const SUBJECT_MAX: usize = 200;

impl Subject {
    /// Validate and construct a [`Subject`], trimming surrounding
    /// whitespace.
    pub fn new(subject: impl Into<String>) -> Result<Self, DocumentValidationError> {
        let subject = subject.into();
        let trimmed = subject.trim();
        if trimmed.is_empty() {
            return Err(DocumentValidationError::EmptySubject);
        }
        if trimmed.chars().count() > SUBJECT_MAX {
            return Err(DocumentValidationError::SubjectTooLong { max: SUBJECT_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.0
    }
}

/// Fields required to register a new document.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    pub id: DocumentId,
    pub code: DocumentCode,
    pub kind: DocumentKind,
    pub subject: Subject,
    pub origin_area_id: AreaId,
    pub registered_by: UserId,
    pub registered_at: DateTime<Utc>,
}

/// Full field set used by stores to reassemble a persisted document.
#[derive(Debug, Clone)]
pub(crate) struct DocumentParts {
    pub(crate) id: DocumentId,
    pub(crate) code: DocumentCode,
    pub(crate) kind: DocumentKind,
    pub(crate) subject: Subject,
    pub(crate) status: DocumentStatus,
    pub(crate) origin_area_id: AreaId,
    pub(crate) current_area_id: AreaId,
    pub(crate) registered_by: UserId,
    pub(crate) registered_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) version: i64,
}

/// Document tracked by the derivation workflow.
///
/// ## Invariants
/// - `current_area_id` equals the destination of the latest accepted
///   derivation, or `origin_area_id` when none exist.
/// - `version` increases by exactly one per committed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    code: DocumentCode,
    kind: DocumentKind,
    subject: Subject,
    status: DocumentStatus,
    origin_area_id: AreaId,
    current_area_id: AreaId,
    registered_by: UserId,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl Document {
    /// Register a new document in [`DocumentStatus::Received`] at its
    /// origin area.
    pub fn register(draft: DocumentDraft) -> Self {
        let DocumentDraft {
            id,
            code,
            kind,
            subject,
            origin_area_id,
            registered_by,
            registered_at,
        } = draft;
        Self {
            id,
            code,
            kind,
            subject,
            status: DocumentStatus::Received,
            origin_area_id,
            current_area_id: origin_area_id,
            registered_by,
            registered_at,
            updated_at: registered_at,
            version: 1,
        }
    }

    pub(crate) fn from_parts(parts: DocumentParts) -> Self {
        let DocumentParts {
            id,
            code,
            kind,
            subject,
            status,
            origin_area_id,
            current_area_id,
            registered_by,
            registered_at,
            updated_at,
            version,
        } = parts;
        Self {
            id,
            code,
            kind,
            subject,
            status,
            origin_area_id,
            current_area_id,
            registered_by,
            registered_at,
            updated_at,
            version,
        }
    }

    /// Stable document identifier.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Human tracking code.
    pub fn code(&self) -> &DocumentCode {
        &self.code
    }

    /// Kind of document.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Subject line.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Current lifecycle status.
    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Area where the document first entered the system.
    pub fn origin_area_id(&self) -> AreaId {
        self.origin_area_id
    }

    /// Area currently holding the document.
    pub fn current_area_id(&self) -> AreaId {
        self.current_area_id
    }

    /// User who registered the document.
    pub fn registered_by(&self) -> &UserId {
        &self.registered_by
    }

    /// Registration timestamp.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Timestamp of the last committed transition.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Optimistic concurrency version; incremented by the store per commit.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Copy of the document with a new status.
    pub(crate) fn with_status(&self, status: DocumentStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Copy of the document relocated to `area` with a new status.
    pub(crate) fn moved_to(
        &self,
        area: AreaId,
        status: DocumentStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            current_area_id: area,
            status,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Copy of the document carrying the version assigned by the store.
    pub(crate) fn with_version(&self, version: i64) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }
}
