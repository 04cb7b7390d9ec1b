//! PostgreSQL-backed `DocumentStore` implementation using Diesel ORM.
//!
//! Every transition lands as one transaction: the document update is guarded
//! by its version column, derivation writes key on the pending status, and
//! the audit entry joins the same commit. Zero affected rows aborts the
//! transaction with a conflict, so a losing writer leaves no trace.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::derivation::DerivationParts;
use crate::domain::document::DocumentParts;
use crate::domain::ports::{DocumentCreation, DocumentStore, DocumentStoreError, TransitionCommit};
use crate::domain::{
    AreaId, AreaInboxEntry, AuditEntry, Derivation, DerivationId, DerivationStatus, Document,
    DocumentCode, DocumentId, DocumentKind, DocumentStatus, Reason, Subject, UserId,
    WorkflowAction,
};

use super::diesel_error_mapping;
use super::models::{
    AuditEntryRow, DerivationDecisionUpdate, DerivationRow, DocumentRow, DocumentTransitionUpdate,
    NewAuditEntryRow, NewDerivationRow, NewDocumentRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{audit_trail, derivations, documents};

/// Diesel-backed implementation of the document store port.
#[derive(Clone)]
pub struct DieselDocumentStore {
    pool: DbPool,
}

impl DieselDocumentStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain store errors.
fn map_pool_error(error: PoolError) -> DocumentStoreError {
    diesel_error_mapping::map_pool_error(error, DocumentStoreError::connection)
}

/// Map Diesel errors to domain store errors.
fn map_diesel_error(error: diesel::result::Error) -> DocumentStoreError {
    diesel_error_mapping::map_diesel_error(
        error,
        DocumentStoreError::conflict,
        DocumentStoreError::query,
        DocumentStoreError::connection,
    )
}

/// Error local to one store transaction.
///
/// `Conflict` aborts the transaction so the rollback happens before the
/// error surfaces as [`DocumentStoreError::Conflict`].
enum TxError {
    Conflict(String),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_tx_error(error: TxError) -> DocumentStoreError {
    match error {
        TxError::Conflict(message) => DocumentStoreError::conflict(message),
        TxError::Diesel(error) => map_diesel_error(error),
    }
}

fn document_insert_row(document: &Document) -> NewDocumentRow<'_> {
    NewDocumentRow {
        id: *document.id().as_uuid(),
        code: document.code().as_ref(),
        kind: document.kind().as_str(),
        subject: document.subject().as_ref(),
        status: document.status().as_str(),
        origin_area_id: *document.origin_area_id().as_uuid(),
        current_area_id: *document.current_area_id().as_uuid(),
        registered_by: *document.registered_by().as_uuid(),
        registered_at: document.registered_at(),
        updated_at: document.updated_at(),
        version: document.version(),
    }
}

fn derivation_insert_row(derivation: &Derivation) -> NewDerivationRow<'_> {
    NewDerivationRow {
        id: *derivation.id().as_uuid(),
        document_id: *derivation.document_id().as_uuid(),
        source_area_id: *derivation.source_area_id().as_uuid(),
        destination_area_id: *derivation.destination_area_id().as_uuid(),
        requested_by: *derivation.requested_by().as_uuid(),
        requested_at: derivation.requested_at(),
        status: derivation.status().as_str(),
    }
}

fn audit_insert_row(entry: &AuditEntry) -> NewAuditEntryRow<'_> {
    NewAuditEntryRow {
        document_id: *entry.document_id.as_uuid(),
        actor: *entry.actor.as_uuid(),
        action: entry.action.as_str(),
        from_status: entry.from_status.map(DocumentStatus::as_str),
        to_status: entry.to_status.as_str(),
        source_area_id: entry.source_area_id.map(|area| *area.as_uuid()),
        destination_area_id: entry.destination_area_id.map(|area| *area.as_uuid()),
        note: entry.note.as_ref().map(|note| note.as_ref()),
        recorded_at: entry.recorded_at,
    }
}

/// Convert a database row into a validated domain document.
fn row_to_document(row: DocumentRow) -> Result<Document, DocumentStoreError> {
    let DocumentRow {
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
    } = row;

    let code =
        DocumentCode::new(code).map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let kind = kind
        .parse::<DocumentKind>()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let subject = Subject::new(subject).map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let status = status
        .parse::<DocumentStatus>()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;

    Ok(Document::from_parts(DocumentParts {
        id: DocumentId::from_uuid(id),
        code,
        kind,
        subject,
        status,
        origin_area_id: AreaId::from_uuid(origin_area_id),
        current_area_id: AreaId::from_uuid(current_area_id),
        registered_by: UserId::from_uuid(registered_by),
        registered_at,
        updated_at,
        version,
    }))
}

/// Convert a database row into a validated domain derivation.
fn row_to_derivation(row: DerivationRow) -> Result<Derivation, DocumentStoreError> {
    let DerivationRow {
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
    } = row;

    let status = status
        .parse::<DerivationStatus>()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let decision_reason = decision_reason
        .map(Reason::new)
        .transpose()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;

    Ok(Derivation::from_parts(DerivationParts {
        id: DerivationId::from_uuid(id),
        document_id: DocumentId::from_uuid(document_id),
        source_area_id: AreaId::from_uuid(source_area_id),
        destination_area_id: AreaId::from_uuid(destination_area_id),
        requested_by: UserId::from_uuid(requested_by),
        requested_at,
        status,
        decided_by: decided_by.map(UserId::from_uuid),
        decided_at,
        decision_reason,
    }))
}

/// Convert a database row into a domain audit entry.
fn row_to_audit_entry(row: AuditEntryRow) -> Result<AuditEntry, DocumentStoreError> {
    let AuditEntryRow {
        document_id,
        actor,
        action,
        from_status,
        to_status,
        source_area_id,
        destination_area_id,
        note,
        recorded_at,
    } = row;

    let action = action
        .parse::<WorkflowAction>()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let from_status = from_status
        .map(|status| status.parse::<DocumentStatus>())
        .transpose()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let to_status = to_status
        .parse::<DocumentStatus>()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;
    let note = note
        .map(Reason::new)
        .transpose()
        .map_err(|err| DocumentStoreError::query(err.to_string()))?;

    Ok(AuditEntry {
        document_id: DocumentId::from_uuid(document_id),
        actor: UserId::from_uuid(actor),
        action,
        from_status,
        to_status,
        source_area_id: source_area_id.map(AreaId::from_uuid),
        destination_area_id: destination_area_id.map(AreaId::from_uuid),
        note,
        recorded_at,
    })
}

#[async_trait]
impl DocumentStore for DieselDocumentStore {
    async fn create_document(
        &self,
        creation: DocumentCreation,
    ) -> Result<Document, DocumentStoreError> {
        let DocumentCreation { document, audit } = creation;
        {
            let document_row = document_insert_row(&document);
            let audit_row = audit_insert_row(&audit);
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;

            conn.transaction(|conn| {
                async move {
                    diesel::insert_into(documents::table)
                        .values(&document_row)
                        .execute(conn)
                        .await?;

                    diesel::insert_into(audit_trail::table)
                        .values(&audit_row)
                        .execute(conn)
                        .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        }

        Ok(document)
    }

    async fn load_document(
        &self,
        id: DocumentId,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = documents::table
            .filter(documents::id.eq(id.as_uuid()))
            .select(DocumentRow::as_select())
            .first::<DocumentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_document).transpose()
    }

    async fn load_derivation(
        &self,
        id: DerivationId,
    ) -> Result<Option<Derivation>, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = derivations::table
            .filter(derivations::id.eq(id.as_uuid()))
            .select(DerivationRow::as_select())
            .first::<DerivationRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_derivation).transpose()
    }

    async fn pending_derivation_for(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<Derivation>, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = derivations::table
            .filter(derivations::document_id.eq(document_id.as_uuid()))
            .filter(derivations::status.eq(DerivationStatus::Pending.as_str()))
            .select(DerivationRow::as_select())
            .first::<DerivationRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_derivation).transpose()
    }

    async fn area_inbox(
        &self,
        area_id: AreaId,
    ) -> Result<Vec<AreaInboxEntry>, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(DerivationRow, DocumentRow)> = derivations::table
            .inner_join(documents::table)
            .filter(derivations::destination_area_id.eq(area_id.as_uuid()))
            .filter(derivations::status.eq(DerivationStatus::Pending.as_str()))
            .order((derivations::requested_at.asc(), derivations::id.asc()))
            .select((DerivationRow::as_select(), DocumentRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(derivation_row, document_row)| {
                Ok(AreaInboxEntry {
                    derivation: row_to_derivation(derivation_row)?,
                    document: row_to_document(document_row)?,
                })
            })
            .collect()
    }

    async fn audit_trail(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AuditEntry>, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<AuditEntryRow> = audit_trail::table
            .filter(audit_trail::document_id.eq(document_id.as_uuid()))
            .order(audit_trail::id.asc())
            .select(AuditEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_audit_entry).collect()
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<Document, DocumentStoreError> {
        let TransitionCommit {
            document,
            new_derivation,
            decided_derivation,
            audit,
        } = commit;

        let document_id = *document.id().as_uuid();
        let expected_version = document.version();
        let update = DocumentTransitionUpdate {
            status: document.status().as_str(),
            current_area_id: *document.current_area_id().as_uuid(),
            updated_at: document.updated_at(),
            version: expected_version + 1,
        };
        let derivation_row = new_derivation.as_ref().map(derivation_insert_row);
        let decision = decided_derivation.as_ref().map(|derivation| {
            let decision_update = DerivationDecisionUpdate {
                status: derivation.status().as_str(),
                decided_by: derivation.decided_by().map(|user| *user.as_uuid()),
                decided_at: derivation.decided_at(),
                decision_reason: derivation.decision_reason().map(|reason| reason.as_ref()),
            };
            (*derivation.id().as_uuid(), decision_update)
        });
        let audit_row = audit_insert_row(&audit);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(
                    documents::table
                        .filter(documents::id.eq(document_id))
                        .filter(documents::version.eq(expected_version)),
                )
                .set(&update)
                .execute(conn)
                .await?;

                if updated == 0 {
                    return Err(TxError::Conflict(format!(
                        "document {document_id} changed concurrently at version {expected_version}"
                    )));
                }

                if let Some(row) = &derivation_row {
                    diesel::insert_into(derivations::table)
                        .values(row)
                        .execute(conn)
                        .await?;
                }

                if let Some((derivation_id, decision_update)) = &decision {
                    let decided = diesel::update(
                        derivations::table
                            .filter(derivations::id.eq(derivation_id))
                            .filter(
                                derivations::status.eq(DerivationStatus::Pending.as_str()),
                            ),
                    )
                    .set(decision_update)
                    .execute(conn)
                    .await?;

                    if decided == 0 {
                        return Err(TxError::Conflict(format!(
                            "derivation {derivation_id} is no longer pending"
                        )));
                    }
                }

                diesel::insert_into(audit_trail::table)
                    .values(&audit_row)
                    .execute(conn)
                    .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)?;

        Ok(document.with_version(expected_version + 1))
    }
}
