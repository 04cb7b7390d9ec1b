//! Derivation workflow: the state machine moving documents between areas.
//!
//! Every operation takes an explicit [`CallerIdentity`] and runs as one
//! atomic commit against the [`DocumentStore`]. Preconditions are checked
//! against a freshly loaded snapshot; the store's version check rejects the
//! commit if another transition landed in between, so a precondition that
//! held at check time still holds at commit time or the caller sees a
//! conflict.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::warn;

use crate::domain::area::{Area, AreaId};
use crate::domain::audit::{AuditEntry, WorkflowAction};
use crate::domain::derivation::{
    AreaInboxEntry, Derivation, DerivationDraft, DerivationId, DerivationStatus, Reason,
};
use crate::domain::document::{
    Document, DocumentCode, DocumentDraft, DocumentId, DocumentKind, DocumentStatus, Subject,
};
use crate::domain::error::Error as DomainError;
use crate::domain::identity::CallerIdentity;
use crate::domain::permissions::Capability;
use crate::domain::ports::{
    DerivationEvent, DerivationEventKind, DerivationNotifier, DirectoryRepository,
    DirectoryRepositoryError, DocumentCreation, DocumentStore, DocumentStoreError,
    TransitionCommit,
};

/// Failure modes of a workflow operation.
///
/// Each variant maps to a distinct caller-facing response; see the
/// `From<WorkflowError>` conversion onto the shared error payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Caller lacks a required capability or acts outside their area.
    #[error("{message}")]
    PermissionDenied { message: String },
    /// The requested transition is not legal from the current state.
    #[error("{message}")]
    InvalidTransition { message: String },
    /// A concurrent mutation won the race; retry once after reloading.
    #[error("{message}")]
    Conflict { message: String },
    /// The referenced document, derivation, or area does not exist.
    #[error("{message}")]
    NotFound { message: String },
    /// A storage collaborator failed; nothing was written.
    #[error("persistence failure: {source}")]
    Persistence { source: DomainError },
}

impl WorkflowError {
    fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<WorkflowError> for DomainError {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::PermissionDenied { message } => DomainError::forbidden(message),
            WorkflowError::InvalidTransition { message } => DomainError::conflict(message)
                .with_details(serde_json::json!({ "reason": "invalid_transition" })),
            WorkflowError::Conflict { message } => DomainError::conflict(message)
                .with_details(serde_json::json!({ "reason": "concurrent_update" })),
            WorkflowError::NotFound { message } => DomainError::not_found(message),
            WorkflowError::Persistence { source } => source,
        }
    }
}

fn map_store_error(error: DocumentStoreError) -> WorkflowError {
    match error {
        DocumentStoreError::Conflict { message } => WorkflowError::Conflict { message },
        DocumentStoreError::Connection { message } => WorkflowError::Persistence {
            source: DomainError::service_unavailable(format!(
                "document store unavailable: {message}"
            )),
        },
        DocumentStoreError::Query { message } => WorkflowError::Persistence {
            source: DomainError::internal(format!("document store error: {message}")),
        },
    }
}

fn map_directory_error(error: DirectoryRepositoryError) -> WorkflowError {
    match error {
        DirectoryRepositoryError::Connection { message } => WorkflowError::Persistence {
            source: DomainError::service_unavailable(format!("directory unavailable: {message}")),
        },
        other => WorkflowError::Persistence {
            source: DomainError::internal(format!("directory error: {other}")),
        },
    }
}

/// Fields required to register a new document at its intake area.
#[derive(Debug, Clone)]
pub struct RegisterDocumentRequest {
    pub code: DocumentCode,
    pub kind: DocumentKind,
    pub subject: Subject,
    pub initial_area_id: AreaId,
}

/// Fields required to request a derivation.
#[derive(Debug, Clone)]
pub struct DeriveDocumentRequest {
    pub destination_area_id: AreaId,
}

/// A document and the derivation touched by the same commit.
#[derive(Debug, Clone)]
pub struct DerivationOutcome {
    pub document: Document,
    pub derivation: Derivation,
}

/// Domain service executing document lifecycle transitions.
///
/// Generic over the store and directory so tests can plug mocks in and the
/// server can erase the adapter types behind `dyn` ports.
pub struct DerivationWorkflow<S: ?Sized, D: ?Sized> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<dyn DerivationNotifier>,
    clock: Arc<dyn Clock>,
}

// Derived `Clone` would demand `S: Clone` even though only the handles are
// cloned.
impl<S: ?Sized, D: ?Sized> Clone for DerivationWorkflow<S, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
            notifier: Arc::clone(&self.notifier),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: ?Sized, D: ?Sized> DerivationWorkflow<S, D> {
    /// Create a workflow over the given store, directory, and notifier.
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        notifier: Arc<dyn DerivationNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            clock,
        }
    }
}

impl<S, D> DerivationWorkflow<S, D>
where
    S: DocumentStore + ?Sized,
    D: DirectoryRepository + ?Sized,
{
    /// Register a new document in [`DocumentStatus::Received`] at the
    /// intake area. Requires [`Capability::CreateDocuments`]; the area must
    /// exist and be active.
    pub async fn register(
        &self,
        caller: &CallerIdentity,
        request: RegisterDocumentRequest,
    ) -> Result<Document, WorkflowError> {
        if !caller.can(Capability::CreateDocuments) {
            return Err(WorkflowError::permission_denied(
                "registering documents requires the create capability",
            ));
        }
        let area = self.require_active_area(request.initial_area_id).await?;

        let now = self.clock.utc();
        let document = Document::register(DocumentDraft {
            id: DocumentId::random(),
            code: request.code,
            kind: request.kind,
            subject: request.subject,
            origin_area_id: area.id(),
            registered_by: caller.user_id().clone(),
            registered_at: now,
        });
        let audit = AuditEntry {
            document_id: document.id(),
            actor: caller.user_id().clone(),
            action: WorkflowAction::Register,
            from_status: None,
            to_status: DocumentStatus::Received,
            source_area_id: None,
            destination_area_id: Some(area.id()),
            note: None,
            recorded_at: now,
        };

        self.store
            .create_document(DocumentCreation { document, audit })
            .await
            .map_err(map_store_error)
    }

    /// Move a received document into review at its holding area.
    pub async fn start_review(
        &self,
        caller: &CallerIdentity,
        document_id: DocumentId,
    ) -> Result<Document, WorkflowError> {
        if !caller.can(Capability::EditDocuments) {
            return Err(WorkflowError::permission_denied(
                "starting review requires the edit capability",
            ));
        }
        let document = self.require_document(document_id).await?;
        if !caller.acts_for(document.current_area_id()) {
            return Err(WorkflowError::permission_denied(
                "only the area holding the document can start its review",
            ));
        }
        if document.status() != DocumentStatus::Received {
            return Err(WorkflowError::invalid_transition(format!(
                "cannot start review of a document in status {}",
                document.status()
            )));
        }

        let now = self.clock.utc();
        let updated = document.with_status(DocumentStatus::InReview, now);
        let audit = AuditEntry {
            document_id,
            actor: caller.user_id().clone(),
            action: WorkflowAction::StartReview,
            from_status: Some(document.status()),
            to_status: DocumentStatus::InReview,
            source_area_id: None,
            destination_area_id: None,
            note: None,
            recorded_at: now,
        };

        self.commit(updated, None, None, audit).await
    }

    /// Request a derivation towards another area, leaving the document in
    /// [`DocumentStatus::Derived`] with one pending derivation.
    pub async fn derive(
        &self,
        caller: &CallerIdentity,
        document_id: DocumentId,
        request: DeriveDocumentRequest,
    ) -> Result<DerivationOutcome, WorkflowError> {
        if !caller.can(Capability::DeriveDocuments) {
            return Err(WorkflowError::permission_denied(
                "deriving documents requires the derive capability",
            ));
        }
        let document = self.require_document(document_id).await?;
        if document.status().is_terminal() {
            return Err(WorkflowError::invalid_transition(format!(
                "cannot derive a document in status {}",
                document.status()
            )));
        }
        if request.destination_area_id == document.current_area_id() {
            return Err(WorkflowError::invalid_transition(
                "cannot derive a document to the area already holding it",
            ));
        }
        let destination = self
            .require_active_area(request.destination_area_id)
            .await?;
        if let Some(pending) = self
            .store
            .pending_derivation_for(document_id)
            .await
            .map_err(map_store_error)?
        {
            return Err(WorkflowError::Conflict {
                message: format!(
                    "a pending derivation ({}) already exists for this document",
                    pending.id()
                ),
            });
        }
        if !matches!(
            document.status(),
            DocumentStatus::Received | DocumentStatus::InReview
        ) {
            return Err(WorkflowError::invalid_transition(format!(
                "cannot derive a document in status {}",
                document.status()
            )));
        }

        let now = self.clock.utc();
        let derivation = Derivation::request(DerivationDraft {
            id: DerivationId::random(),
            document_id,
            source_area_id: document.current_area_id(),
            destination_area_id: destination.id(),
            requested_by: caller.user_id().clone(),
            requested_at: now,
        });
        let updated = document.with_status(DocumentStatus::Derived, now);
        let audit = AuditEntry {
            document_id,
            actor: caller.user_id().clone(),
            action: WorkflowAction::Derive,
            from_status: Some(document.status()),
            to_status: DocumentStatus::Derived,
            source_area_id: Some(document.current_area_id()),
            destination_area_id: Some(destination.id()),
            note: None,
            recorded_at: now,
        };

        let committed = self
            .commit(updated, Some(derivation.clone()), None, audit)
            .await?;
        self.announce(DerivationEventKind::Requested, &derivation).await;

        Ok(DerivationOutcome {
            document: committed,
            derivation,
        })
    }

    /// Accept a pending derivation: the document moves to the destination
    /// area and re-enters review there.
    pub async fn accept_derivation(
        &self,
        caller: &CallerIdentity,
        derivation_id: DerivationId,
    ) -> Result<DerivationOutcome, WorkflowError> {
        let derivation = self.require_derivation(derivation_id).await?;
        if !caller.acts_for(derivation.destination_area_id()) {
            return Err(WorkflowError::permission_denied(
                "only the destination area can decide a derivation",
            ));
        }
        if derivation.status() != DerivationStatus::Pending {
            return Err(WorkflowError::invalid_transition(format!(
                "derivation is already {}",
                derivation.status()
            )));
        }
        let document = self.require_document(derivation.document_id()).await?;

        let now = self.clock.utc();
        let decided = derivation.accepted(caller.user_id().clone(), now);
        let updated = document.moved_to(
            derivation.destination_area_id(),
            DocumentStatus::InReview,
            now,
        );
        let audit = AuditEntry {
            document_id: document.id(),
            actor: caller.user_id().clone(),
            action: WorkflowAction::AcceptDerivation,
            from_status: Some(document.status()),
            to_status: DocumentStatus::InReview,
            source_area_id: Some(derivation.source_area_id()),
            destination_area_id: Some(derivation.destination_area_id()),
            note: None,
            recorded_at: now,
        };

        let committed = self.commit(updated, None, Some(decided.clone()), audit).await?;
        self.announce(DerivationEventKind::Accepted, &decided).await;

        Ok(DerivationOutcome {
            document: committed,
            derivation: decided,
        })
    }

    /// Reject a pending derivation: the document stays at its prior area
    /// and reverts to [`DocumentStatus::InReview`] so it can be routed
    /// again.
    pub async fn reject_derivation(
        &self,
        caller: &CallerIdentity,
        derivation_id: DerivationId,
        reason: Reason,
    ) -> Result<DerivationOutcome, WorkflowError> {
        let derivation = self.require_derivation(derivation_id).await?;
        if !caller.acts_for(derivation.destination_area_id()) {
            return Err(WorkflowError::permission_denied(
                "only the destination area can decide a derivation",
            ));
        }
        if derivation.status() != DerivationStatus::Pending {
            return Err(WorkflowError::invalid_transition(format!(
                "derivation is already {}",
                derivation.status()
            )));
        }
        let document = self.require_document(derivation.document_id()).await?;

        let now = self.clock.utc();
        let decided = derivation.rejected(caller.user_id().clone(), now, reason.clone());
        let updated = document.with_status(DocumentStatus::InReview, now);
        let audit = AuditEntry {
            document_id: document.id(),
            actor: caller.user_id().clone(),
            action: WorkflowAction::RejectDerivation,
            from_status: Some(document.status()),
            to_status: DocumentStatus::InReview,
            source_area_id: Some(derivation.source_area_id()),
            destination_area_id: Some(derivation.destination_area_id()),
            note: Some(reason),
            recorded_at: now,
        };

        let committed = self.commit(updated, None, Some(decided.clone()), audit).await?;
        self.announce(DerivationEventKind::Rejected, &decided).await;

        Ok(DerivationOutcome {
            document: committed,
            derivation: decided,
        })
    }

    /// Close a document under review at the caller's area.
    pub async fn close(
        &self,
        caller: &CallerIdentity,
        document_id: DocumentId,
    ) -> Result<Document, WorkflowError> {
        if !caller.can(Capability::EditDocuments) {
            return Err(WorkflowError::permission_denied(
                "closing documents requires the edit capability",
            ));
        }
        let document = self.require_document(document_id).await?;
        if !caller.acts_for(document.current_area_id()) {
            return Err(WorkflowError::permission_denied(
                "only the area holding the document can close it",
            ));
        }
        if document.status() != DocumentStatus::InReview {
            return Err(WorkflowError::invalid_transition(format!(
                "cannot close a document in status {}",
                document.status()
            )));
        }

        let now = self.clock.utc();
        let updated = document.with_status(DocumentStatus::Closed, now);
        let audit = AuditEntry {
            document_id,
            actor: caller.user_id().clone(),
            action: WorkflowAction::Close,
            from_status: Some(document.status()),
            to_status: DocumentStatus::Closed,
            source_area_id: None,
            destination_area_id: None,
            note: None,
            recorded_at: now,
        };

        self.commit(updated, None, None, audit).await
    }

    /// Reject a document from any non-terminal status. A pending
    /// derivation, if one exists, is rejected in the same commit so no
    /// open route survives a terminal document.
    pub async fn reject(
        &self,
        caller: &CallerIdentity,
        document_id: DocumentId,
        reason: Reason,
    ) -> Result<Document, WorkflowError> {
        if !caller.can(Capability::EditDocuments) {
            return Err(WorkflowError::permission_denied(
                "rejecting documents requires the edit capability",
            ));
        }
        let document = self.require_document(document_id).await?;
        if document.status().is_terminal() {
            return Err(WorkflowError::invalid_transition(format!(
                "cannot reject a document in status {}",
                document.status()
            )));
        }

        let now = self.clock.utc();
        let decided = self
            .store
            .pending_derivation_for(document_id)
            .await
            .map_err(map_store_error)?
            .map(|pending| pending.rejected(caller.user_id().clone(), now, reason.clone()));
        let updated = document.with_status(DocumentStatus::Rejected, now);
        let audit = AuditEntry {
            document_id,
            actor: caller.user_id().clone(),
            action: WorkflowAction::Reject,
            from_status: Some(document.status()),
            to_status: DocumentStatus::Rejected,
            source_area_id: None,
            destination_area_id: None,
            note: Some(reason),
            recorded_at: now,
        };

        self.commit(updated, None, decided, audit).await
    }

    /// Fetch a document by id.
    pub async fn document(
        &self,
        _caller: &CallerIdentity,
        document_id: DocumentId,
    ) -> Result<Document, WorkflowError> {
        self.require_document(document_id).await
    }

    /// The document's audit trail in commit order. Requires
    /// [`Capability::ReadAuditTrail`].
    pub async fn audit_trail(
        &self,
        caller: &CallerIdentity,
        document_id: DocumentId,
    ) -> Result<Vec<AuditEntry>, WorkflowError> {
        if !caller.can(Capability::ReadAuditTrail) {
            return Err(WorkflowError::permission_denied(
                "reading the audit trail requires the audit capability",
            ));
        }
        self.require_document(document_id).await?;
        self.store
            .audit_trail(document_id)
            .await
            .map_err(map_store_error)
    }

    /// Pending derivations routed to `area_id`, oldest first. Callers see
    /// their own area's inbox; auditors see any.
    pub async fn pending_inbox(
        &self,
        caller: &CallerIdentity,
        area_id: AreaId,
    ) -> Result<Vec<AreaInboxEntry>, WorkflowError> {
        if !caller.acts_for(area_id) && !caller.can(Capability::ReadAuditTrail) {
            return Err(WorkflowError::permission_denied(
                "only the receiving area or an auditor can read this inbox",
            ));
        }
        self.store.area_inbox(area_id).await.map_err(map_store_error)
    }

    async fn require_document(&self, id: DocumentId) -> Result<Document, WorkflowError> {
        self.store
            .load_document(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| WorkflowError::not_found(format!("document {id} does not exist")))
    }

    async fn require_derivation(&self, id: DerivationId) -> Result<Derivation, WorkflowError> {
        self.store
            .load_derivation(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| WorkflowError::not_found(format!("derivation {id} does not exist")))
    }

    async fn require_active_area(&self, id: AreaId) -> Result<Area, WorkflowError> {
        let area = self
            .directory
            .find_area(id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| WorkflowError::not_found(format!("area {id} does not exist")))?;
        if !area.is_active() {
            return Err(WorkflowError::invalid_transition(format!(
                "area {} is not active",
                area.code()
            )));
        }
        Ok(area)
    }

    async fn commit(
        &self,
        document: Document,
        new_derivation: Option<Derivation>,
        decided_derivation: Option<Derivation>,
        audit: AuditEntry,
    ) -> Result<Document, WorkflowError> {
        self.store
            .commit_transition(TransitionCommit {
                document,
                new_derivation,
                decided_derivation,
                audit,
            })
            .await
            .map_err(map_store_error)
    }

    /// Best-effort notification; a delivery failure is logged, never
    /// propagated.
    async fn announce(&self, kind: DerivationEventKind, derivation: &Derivation) {
        let event = DerivationEvent {
            kind,
            document_id: derivation.document_id(),
            destination_area_id: derivation.destination_area_id(),
        };
        if let Err(error) = self.notifier.notify(event).await {
            warn!(error = %error, "derivation notification failed");
        }
    }
}
