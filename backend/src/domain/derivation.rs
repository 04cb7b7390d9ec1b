//! Derivation model: a routing request between two areas.
//!
//! A derivation asks the destination area to take over a document. It stays
//! `Pending` until the destination accepts or rejects it; decided
//! derivations are immutable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::area::AreaId;
use crate::domain::document::{Document, DocumentId};
use crate::domain::user::UserId;

/// Validation errors raised by the derivation newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationValidationError {
    EmptyReason,
    ReasonTooLong { max: usize },
}

impl fmt::Display for DerivationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReason => write!(f, "reason must not be empty"),
            Self::ReasonTooLong { max } => {
                write!(f, "reason must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for DerivationValidationError {}

/// Stable derivation identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationId(Uuid);

impl DerivationId {
    /// Generate a new random [`DerivationId`].
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

impl fmt::Display for DerivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decision state of a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DerivationStatus {
    /// Awaiting the destination area's decision.
    Pending,
    /// Destination took over the document.
    Accepted,
    /// Destination declined; the document stayed at its source.
    Rejected,
}

impl DerivationStatus {
    /// Stable machine-readable name used in storage and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DerivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown derivation status: {0}")]
pub struct ParseDerivationStatusError(String);

impl FromStr for DerivationStatus {
    type Err = ParseDerivationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseDerivationStatusError(other.to_owned())),
        }
    }
}

/// Free-text reason attached to rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason(String);

/// Maximum allowed length for a reason.
pub const REASON_MAX: usize = 500;

impl Reason {
    /// Validate and construct a [`Reason`], trimming surrounding whitespace.
    pub fn new(reason: impl Into<String>) -> Result<Self, DerivationValidationError> {
        let reason = reason.into();
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(DerivationValidationError::EmptyReason);
        }
        if trimmed.chars().count() > REASON_MAX {
            return Err(DerivationValidationError::ReasonTooLong { max: REASON_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Reason {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Reason> for String {
    fn from(value: Reason) -> Self {
        value.0
    }
}

/// Fields required to request a new derivation.
#[derive(Debug, Clone)]
pub struct DerivationDraft {
    pub id: DerivationId,
    pub document_id: DocumentId,
    pub source_area_id: AreaId,
    pub destination_area_id: AreaId,
    pub requested_by: UserId,
    pub requested_at: DateTime<Utc>,
}

/// Full field set used by stores to reassemble a persisted derivation.
#[derive(Debug, Clone)]
pub(crate) struct DerivationParts {
    pub(crate) id: DerivationId,
    pub(crate) document_id: DocumentId,
    pub(crate) source_area_id: AreaId,
    pub(crate) destination_area_id: AreaId,
    pub(crate) requested_by: UserId,
    pub(crate) requested_at: DateTime<Utc>,
    pub(crate) status: DerivationStatus,
    pub(crate) decided_by: Option<UserId>,
    pub(crate) decided_at: Option<DateTime<Utc>>,
    pub(crate) decision_reason: Option<Reason>,
}

/// Routing request moving a document from one area to another.
///
/// ## Invariants
/// - `source_area_id` equals the document's current area at request time.
/// - Once `Accepted` or `Rejected`, the decision fields never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    id: DerivationId,
    document_id: DocumentId,
    source_area_id: AreaId,
    destination_area_id: AreaId,
    requested_by: UserId,
    requested_at: DateTime<Utc>,
    status: DerivationStatus,
    decided_by: Option<UserId>,
    decided_at: Option<DateTime<Utc>>,
    decision_reason: Option<Reason>,
}

impl Derivation {
    /// Open a new pending derivation.
    pub fn request(draft: DerivationDraft) -> Self {
        let DerivationDraft {
            id,
            document_id,
            source_area_id,
            destination_area_id,
            requested_by,
            requested_at,
        } = draft;
        Self {
            id,
            document_id,
            source_area_id,
            destination_area_id,
            requested_by,
            requested_at,
            status: DerivationStatus::Pending,
            decided_by: None,
            decided_at: None,
            decision_reason: None,
        }
    }

    pub(crate) fn from_parts(parts: DerivationParts) -> Self {
        let DerivationParts {
            id,
            document_id,
            source_area_id,
            destination_area_id,
            requested_by,
            requested_at,
            status,
            decided_by,
            decided_at,
            decision_reason,
        } = parts;
        Self {
            id,
            document_id,
            source_area_id,
            destination_area_id,
            requested_by,
            requested_at,
            status,
            decided_by,
            decided_at,
            decision_reason,
        }
    }

    /// Stable derivation identifier.
    pub fn id(&self) -> DerivationId {
        self.id
    }

    /// Document being routed.
    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    /// Area holding the document when the derivation was requested.
    pub fn source_area_id(&self) -> AreaId {
        self.source_area_id
    }

    /// Area asked to take over the document.
    pub fn destination_area_id(&self) -> AreaId {
        self.destination_area_id
    }

    /// User who requested the routing.
    pub fn requested_by(&self) -> &UserId {
        &self.requested_by
    }

    /// Request timestamp.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Decision state.
    pub fn status(&self) -> DerivationStatus {
        self.status
    }

    /// User who decided the derivation, once decided.
    pub fn decided_by(&self) -> Option<&UserId> {
        self.decided_by.as_ref()
    }

    /// Decision timestamp, once decided.
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    /// Reason recorded with a rejection.
    pub fn decision_reason(&self) -> Option<&Reason> {
        self.decision_reason.as_ref()
    }

    /// Copy of the derivation accepted by `decided_by`.
    pub(crate) fn accepted(&self, decided_by: UserId, decided_at: DateTime<Utc>) -> Self {
        Self {
            status: DerivationStatus::Accepted,
            decided_by: Some(decided_by),
            decided_at: Some(decided_at),
            decision_reason: None,
            ..self.clone()
        }
    }

    /// Copy of the derivation rejected by `decided_by` for `reason`.
    pub(crate) fn rejected(
        &self,
        decided_by: UserId,
        decided_at: DateTime<Utc>,
        reason: Reason,
    ) -> Self {
        Self {
            status: DerivationStatus::Rejected,
            decided_by: Some(decided_by),
            decided_at: Some(decided_at),
            decision_reason: Some(reason),
            ..self.clone()
        }
    }
}

/// A pending derivation paired with its document, as shown in an area's
/// inbox of incoming routes.
#[derive(Debug, Clone)]
pub struct AreaInboxEntry {
    pub derivation: Derivation,
    pub document: Document,
}
