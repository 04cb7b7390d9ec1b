//! Port for transactional document, derivation, and audit persistence.
//!
//! The store is the single synchronization point for the workflow: every
//! transition is one atomic commit guarded by the document's version. Two
//! racing transitions on the same document cannot both succeed; the loser
//! observes [`DocumentStoreError::Conflict`].

use async_trait::async_trait;

use crate::domain::area::AreaId;
use crate::domain::audit::AuditEntry;
use crate::domain::derivation::{AreaInboxEntry, Derivation, DerivationId};
use crate::domain::document::{Document, DocumentId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// Version check failed or a uniqueness rule was violated at commit.
        Conflict { message: String } =>
            "document store conflict: {message}",
        /// Store connection could not be established.
        Connection { message: String } =>
            "document store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "document store query failed: {message}",
    }
}

/// A freshly registered document plus its registration audit entry.
#[derive(Debug, Clone)]
pub struct DocumentCreation {
    pub document: Document,
    pub audit: AuditEntry,
}

/// One workflow transition applied as a single atomic commit.
///
/// `document` carries the new field values and the version the caller
/// loaded; the store commits only when the persisted version still matches,
/// storing `version + 1`. `new_derivation` inserts a pending derivation;
/// `decided_derivation` finalises one that must still be pending in
/// storage. Either way the audit entry lands in the same commit.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub document: Document,
    pub new_derivation: Option<Derivation>,
    pub decided_derivation: Option<Derivation>,
    pub audit: AuditEntry,
}

/// Port for reading and atomically mutating workflow state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and its registration audit entry atomically.
    ///
    /// Fails with `Conflict` when the document id or tracking code is
    /// already taken.
    async fn create_document(
        &self,
        creation: DocumentCreation,
    ) -> Result<Document, DocumentStoreError>;

    /// Find a document by id.
    async fn load_document(
        &self,
        id: DocumentId,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Find a derivation by id.
    async fn load_derivation(
        &self,
        id: DerivationId,
    ) -> Result<Option<Derivation>, DocumentStoreError>;

    /// The document's pending derivation, if one exists.
    async fn pending_derivation_for(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<Derivation>, DocumentStoreError>;

    /// Pending derivations routed to `area_id`, oldest first, each paired
    /// with its document.
    async fn area_inbox(
        &self,
        area_id: AreaId,
    ) -> Result<Vec<AreaInboxEntry>, DocumentStoreError>;

    /// The document's audit trail in commit order.
    async fn audit_trail(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AuditEntry>, DocumentStoreError>;

    /// Apply one transition atomically and return the stored document with
    /// its new version.
    ///
    /// Fails with `Conflict` when the version check misses, when inserting
    /// a second pending derivation for the same document, or when deciding
    /// a derivation that is no longer pending. On failure nothing is
    /// written.
    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<Document, DocumentStoreError>;
}
