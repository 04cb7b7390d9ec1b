//! Driven port announcing derivation activity to interested areas.
//!
//! Delivery is best effort. The workflow commits first and notifies after,
//! so a failed notification can never roll back or fail a transition.

use async_trait::async_trait;
use tracing::info;

use crate::domain::area::AreaId;
use crate::domain::document::DocumentId;

use super::define_port_error;

/// What happened to a derivation, from the receiving area's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationEventKind {
    /// A new derivation was requested towards the destination area.
    Requested,
    /// The destination area accepted the derivation.
    Accepted,
    /// The destination area rejected the derivation.
    Rejected,
}

impl DerivationEventKind {
    /// Stable lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Notification payload handed to the notifier after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationEvent {
    /// What happened.
    pub kind: DerivationEventKind,
    /// Document the derivation belongs to.
    pub document_id: DocumentId,
    /// Area the derivation targets.
    pub destination_area_id: AreaId,
}

define_port_error! {
    /// Errors raised while delivering a derivation event.
    pub enum NotifierError {
        /// The event could not be delivered.
        Delivery { message: String } =>
            "derivation event delivery failed: {message}",
    }
}

/// Port delivering derivation events to whatever channel is configured.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DerivationNotifier: Send + Sync {
    /// Deliver one event.
    async fn notify(&self, event: DerivationEvent) -> Result<(), NotifierError>;
}

/// Default notifier that records events in the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDerivationNotifier;

#[async_trait]
impl DerivationNotifier for LoggingDerivationNotifier {
    async fn notify(&self, event: DerivationEvent) -> Result<(), NotifierError> {
        info!(
            kind = event.kind.as_str(),
            document_id = %event.document_id,
            destination_area_id = %event.destination_area_id,
            "derivation event"
        );
        Ok(())
    }
}
