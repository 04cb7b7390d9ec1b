//! Append-only audit trail (trazabilidad) of workflow transitions.
//!
//! One entry is written per committed transition, inside the same commit.
//! Entries are never mutated or deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::area::AreaId;
use crate::domain::derivation::Reason;
use crate::domain::document::{DocumentId, DocumentStatus};
use crate::domain::user::UserId;

/// Workflow operation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Register,
    StartReview,
    Derive,
    AcceptDerivation,
    RejectDerivation,
    Close,
    Reject,
}

impl WorkflowAction {
    /// Stable machine-readable name used in storage and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::StartReview => "start_review",
            Self::Derive => "derive",
            Self::AcceptDerivation => "accept_derivation",
            Self::RejectDerivation => "reject_derivation",
            Self::Close => "close",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown workflow action: {0}")]
pub struct ParseWorkflowActionError(String);

impl FromStr for WorkflowAction {
    type Err = ParseWorkflowActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(Self::Register),
            "start_review" => Ok(Self::StartReview),
            "derive" => Ok(Self::Derive),
            "accept_derivation" => Ok(Self::AcceptDerivation),
            "reject_derivation" => Ok(Self::RejectDerivation),
            "close" => Ok(Self::Close),
            "reject" => Ok(Self::Reject),
            other => Err(ParseWorkflowActionError(other.to_owned())),
        }
    }
}

/// Immutable record of one committed transition.
///
/// `from_status` is `None` only for [`WorkflowAction::Register`]; the
/// source/destination areas are set for routing actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub document_id: DocumentId,
    pub actor: UserId,
    pub action: WorkflowAction,
    pub from_status: Option<DocumentStatus>,
    pub to_status: DocumentStatus,
    pub source_area_id: Option<AreaId>,
    pub destination_area_id: Option<AreaId>,
    pub note: Option<Reason>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(WorkflowAction::Register, "register")]
    #[case(WorkflowAction::StartReview, "start_review")]
    #[case(WorkflowAction::Derive, "derive")]
    #[case(WorkflowAction::AcceptDerivation, "accept_derivation")]
    #[case(WorkflowAction::RejectDerivation, "reject_derivation")]
    #[case(WorkflowAction::Close, "close")]
    #[case(WorkflowAction::Reject, "reject")]
    fn action_names_round_trip(#[case] action: WorkflowAction, #[case] name: &str) {
        assert_eq!(action.as_str(), name);
        assert_eq!(name.parse::<WorkflowAction>().expect("known name"), action);
    }

    #[rstest]
    fn action_parse_rejects_unknown_names() {
        let err = "reopen".parse::<WorkflowAction>().expect_err("unknown");
        assert_eq!(err.to_string(), "unknown workflow action: reopen");
    }
}
