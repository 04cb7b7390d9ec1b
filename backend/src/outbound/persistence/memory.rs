//! In-memory adapters for the document store and directory ports.
//!
//! These back the server when no database is configured and give tests a
//! real, stateful store. A single mutex per adapter serialises commits, so
//! the version check here observes the same all-or-nothing semantics as
//! the SQL implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::area::{Area, AreaId};
use crate::domain::audit::AuditEntry;
use crate::domain::auth::PasswordHash;
use crate::domain::derivation::{AreaInboxEntry, Derivation, DerivationId, DerivationStatus};
use crate::domain::document::{Document, DocumentId};
use crate::domain::ports::{
    DirectoryRepository, DirectoryRepositoryError, DocumentCreation, DocumentStore,
    DocumentStoreError, TransitionCommit,
};
use crate::domain::role::{Role, RoleId};
use crate::domain::user::{User, UserId, Username};

#[derive(Default)]
struct DocumentState {
    documents: HashMap<DocumentId, Document>,
    codes: HashSet<String>,
    derivations: Vec<Derivation>,
    audit: Vec<AuditEntry>,
}

/// Mutex-serialised [`DocumentStore`] holding all state in process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocumentState>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, DocumentState>, DocumentStoreError> {
        self.state
            .lock()
            .map_err(|_| DocumentStoreError::query("document state mutex poisoned"))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_document(
        &self,
        creation: DocumentCreation,
    ) -> Result<Document, DocumentStoreError> {
        let mut state = self.lock()?;
        let DocumentCreation { document, audit } = creation;
        if state.documents.contains_key(&document.id()) {
            return Err(DocumentStoreError::conflict(format!(
                "document {} already exists",
                document.id()
            )));
        }
        if state.codes.contains(document.code().as_ref()) {
            return Err(DocumentStoreError::conflict(format!(
                "document code {} is already registered",
                document.code()
            )));
        }

        state.codes.insert(document.code().as_ref().to_owned());
        state.documents.insert(document.id(), document.clone());
        state.audit.push(audit);
        Ok(document)
    }

    async fn load_document(
        &self,
        id: DocumentId,
    ) -> Result<Option<Document>, DocumentStoreError> {
        Ok(self.lock()?.documents.get(&id).cloned())
    }

    async fn load_derivation(
        &self,
        id: DerivationId,
    ) -> Result<Option<Derivation>, DocumentStoreError> {
        Ok(self
            .lock()?
            .derivations
            .iter()
            .find(|derivation| derivation.id() == id)
            .cloned())
    }

    async fn pending_derivation_for(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<Derivation>, DocumentStoreError> {
        Ok(self
            .lock()?
            .derivations
            .iter()
            .find(|derivation| {
                derivation.document_id() == document_id
                    && derivation.status() == DerivationStatus::Pending
            })
            .cloned())
    }

    async fn area_inbox(
        &self,
        area_id: AreaId,
    ) -> Result<Vec<AreaInboxEntry>, DocumentStoreError> {
        let state = self.lock()?;
        state
            .derivations
            .iter()
            .filter(|derivation| {
                derivation.destination_area_id() == area_id
                    && derivation.status() == DerivationStatus::Pending
            })
            .map(|derivation| {
                let document = state
                    .documents
                    .get(&derivation.document_id())
                    .cloned()
                    .ok_or_else(|| {
                        DocumentStoreError::query(format!(
                            "derivation {} references a missing document",
                            derivation.id()
                        ))
                    })?;
                Ok(AreaInboxEntry {
                    derivation: derivation.clone(),
                    document,
                })
            })
            .collect()
    }

    async fn audit_trail(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AuditEntry>, DocumentStoreError> {
        Ok(self
            .lock()?
            .audit
            .iter()
            .filter(|entry| entry.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<Document, DocumentStoreError> {
        let mut state = self.lock()?;
        let TransitionCommit {
            document,
            new_derivation,
            decided_derivation,
            audit,
        } = commit;

        let stored_version = state
            .documents
            .get(&document.id())
            .map(Document::version)
            .ok_or_else(|| {
                DocumentStoreError::conflict(format!(
                    "document {} no longer exists",
                    document.id()
                ))
            })?;
        if stored_version != document.version() {
            return Err(DocumentStoreError::conflict(format!(
                "version check failed for document {}: expected {}, stored {stored_version}",
                document.id(),
                document.version()
            )));
        }

        if new_derivation.is_some() {
            let has_pending = state.derivations.iter().any(|derivation| {
                derivation.document_id() == document.id()
                    && derivation.status() == DerivationStatus::Pending
            });
            if has_pending {
                return Err(DocumentStoreError::conflict(format!(
                    "a pending derivation already exists for document {}",
                    document.id()
                )));
            }
        }

        let decided_index = match &decided_derivation {
            Some(decided) => {
                let index = state
                    .derivations
                    .iter()
                    .position(|derivation| derivation.id() == decided.id())
                    .ok_or_else(|| {
                        DocumentStoreError::conflict(format!(
                            "derivation {} no longer exists",
                            decided.id()
                        ))
                    })?;
                if state.derivations[index].status() != DerivationStatus::Pending {
                    return Err(DocumentStoreError::conflict(format!(
                        "derivation {} is no longer pending",
                        decided.id()
                    )));
                }
                Some(index)
            }
            None => None,
        };

        // Checks passed; apply everything under the same lock.
        let stored = document.with_version(stored_version + 1);
        state.documents.insert(stored.id(), stored.clone());
        if let Some(derivation) = new_derivation {
            state.derivations.push(derivation);
        }
        if let (Some(index), Some(decided)) = (decided_index, decided_derivation) {
            state.derivations[index] = decided;
        }
        state.audit.push(audit);
        Ok(stored)
    }
}

#[derive(Default)]
struct DirectoryState {
    users: Vec<(User, PasswordHash)>,
    roles: HashMap<RoleId, Role>,
    areas: HashMap<AreaId, Area>,
}

/// Mutex-serialised [`DirectoryRepository`] holding users, roles, and areas
/// in process memory.
#[derive(Default)]
pub struct MemoryDirectoryRepository {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectoryRepository {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, DirectoryState>, DirectoryRepositoryError> {
        self.state
            .lock()
            .map_err(|_| DirectoryRepositoryError::query("directory state mutex poisoned"))
    }

    /// Insert or replace a role outside the port, for seeding.
    pub fn seed_role(&self, role: Role) -> Result<(), DirectoryRepositoryError> {
        self.lock()?.roles.insert(role.id(), role);
        Ok(())
    }

    /// Insert or replace an area outside the port, for seeding.
    pub fn seed_area(&self, area: Area) -> Result<(), DirectoryRepositoryError> {
        self.lock()?.areas.insert(area.id(), area);
        Ok(())
    }
}

#[async_trait]
impl DirectoryRepository for MemoryDirectoryRepository {
    async fn create_user(
        &self,
        user: &User,
        password: &PasswordHash,
    ) -> Result<(), DirectoryRepositoryError> {
        let mut state = self.lock()?;
        let taken = state.users.iter().any(|(existing, _)| {
            existing.id() == user.id() || existing.username() == user.username()
        });
        if taken {
            return Err(DirectoryRepositoryError::conflict(format!(
                "user {} already exists",
                user.username()
            )));
        }
        state.users.push((user.clone(), password.clone()));
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), DirectoryRepositoryError> {
        let mut state = self.lock()?;
        let entry = state
            .users
            .iter_mut()
            .find(|(existing, _)| existing.id() == user.id())
            .ok_or_else(|| {
                DirectoryRepositoryError::missing(format!("user {} does not exist", user.id()))
            })?;
        entry.0 = user.clone();
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, DirectoryRepositoryError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|(user, _)| user.id() == id)
            .map(|(user, _)| user.clone()))
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>, DirectoryRepositoryError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|(user, _)| user.username() == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, DirectoryRepositoryError> {
        let mut users: Vec<User> = self
            .lock()?
            .users
            .iter()
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by(|a, b| a.username().as_ref().cmp(b.username().as_ref()));
        Ok(users)
    }

    async fn find_role(&self, id: RoleId) -> Result<Option<Role>, DirectoryRepositoryError> {
        Ok(self.lock()?.roles.get(&id).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DirectoryRepositoryError> {
        let mut roles: Vec<Role> = self.lock()?.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name().as_ref().cmp(b.name().as_ref()));
        Ok(roles)
    }

    async fn find_area(&self, id: AreaId) -> Result<Option<Area>, DirectoryRepositoryError> {
        Ok(self.lock()?.areas.get(&id).cloned())
    }

    async fn list_areas(&self) -> Result<Vec<Area>, DirectoryRepositoryError> {
        let mut areas: Vec<Area> = self.lock()?.areas.values().cloned().collect();
        areas.sort_by(|a, b| a.name().as_ref().cmp(b.name().as_ref()));
        Ok(areas)
    }
}

#[cfg(test)]
mod tests;
