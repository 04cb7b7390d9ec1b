//! Regression coverage for the in-memory adapters.

use chrono::Utc;
use rstest::rstest;

use super::*;
use crate::domain::audit::WorkflowAction;
use crate::domain::derivation::DerivationDraft;
use crate::domain::document::{
    DocumentCode, DocumentDraft, DocumentKind, DocumentStatus, Subject,
};

fn sample_document(code: &str, area: AreaId) -> Document {
    Document::register(DocumentDraft {
        id: DocumentId::random(),
        code: DocumentCode::new(code).expect("valid code"),
        kind: DocumentKind::Official,
        subject: Subject::new("prueba de laboratorio").expect("valid subject"),
        origin_area_id: area,
        registered_by: UserId::random(),
        registered_at: Utc::now(),
    })
}

fn registration_audit(document: &Document) -> AuditEntry {
    AuditEntry {
        document_id: document.id(),
        actor: document.registered_by().clone(),
        action: WorkflowAction::Register,
        from_status: None,
        to_status: DocumentStatus::Received,
        source_area_id: None,
        destination_area_id: Some(document.origin_area_id()),
        note: None,
        recorded_at: document.registered_at(),
    }
}

fn transition_audit(document: &Document, to_status: DocumentStatus) -> AuditEntry {
    AuditEntry {
        document_id: document.id(),
        actor: document.registered_by().clone(),
        action: WorkflowAction::StartReview,
        from_status: Some(document.status()),
        to_status,
        source_area_id: None,
        destination_area_id: None,
        note: None,
        recorded_at: Utc::now(),
    }
}

fn pending_towards(document: &Document, destination: AreaId) -> Derivation {
    Derivation::request(DerivationDraft {
        id: DerivationId::random(),
        document_id: document.id(),
        source_area_id: document.current_area_id(),
        destination_area_id: destination,
        requested_by: document.registered_by().clone(),
        requested_at: Utc::now(),
    })
}

async fn stored_document(store: &MemoryDocumentStore, code: &str, area: AreaId) -> Document {
    let document = sample_document(code, area);
    let audit = registration_audit(&document);
    store
        .create_document(DocumentCreation { document, audit })
        .await
        .expect("creation succeeds")
}

#[rstest]
#[tokio::test]
async fn create_document_rejects_duplicate_code() {
    let store = MemoryDocumentStore::new();
    let area = AreaId::random();
    stored_document(&store, "OF-2024-001", area).await;

    let duplicate = sample_document("OF-2024-001", area);
    let audit = registration_audit(&duplicate);
    let err = store
        .create_document(DocumentCreation {
            document: duplicate,
            audit,
        })
        .await
        .expect_err("duplicate code must conflict");

    assert!(matches!(err, DocumentStoreError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn commit_transition_bumps_version() {
    let store = MemoryDocumentStore::new();
    let document = stored_document(&store, "OF-2024-002", AreaId::random()).await;

    let updated = document.with_status(DocumentStatus::InReview, Utc::now());
    let committed = store
        .commit_transition(TransitionCommit {
            document: updated.clone(),
            new_derivation: None,
            decided_derivation: None,
            audit: transition_audit(&document, DocumentStatus::InReview),
        })
        .await
        .expect("commit succeeds");

    assert_eq!(committed.version(), document.version() + 1);
    assert_eq!(committed.status(), DocumentStatus::InReview);
    let reloaded = store
        .load_document(document.id())
        .await
        .expect("load succeeds")
        .expect("document exists");
    assert_eq!(reloaded, committed);
}

#[rstest]
#[tokio::test]
async fn commit_transition_rejects_stale_version() {
    let store = MemoryDocumentStore::new();
    let document = stored_document(&store, "OF-2024-003", AreaId::random()).await;

    let first = document.with_status(DocumentStatus::InReview, Utc::now());
    store
        .commit_transition(TransitionCommit {
            document: first,
            new_derivation: None,
            decided_derivation: None,
            audit: transition_audit(&document, DocumentStatus::InReview),
        })
        .await
        .expect("first commit succeeds");

    // Second writer still holds the version loaded before the first commit.
    let stale = document.with_status(DocumentStatus::Rejected, Utc::now());
    let err = store
        .commit_transition(TransitionCommit {
            document: stale,
            new_derivation: None,
            decided_derivation: None,
            audit: transition_audit(&document, DocumentStatus::Rejected),
        })
        .await
        .expect_err("stale commit must conflict");

    assert!(matches!(err, DocumentStoreError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn commit_transition_rejects_second_pending_derivation() {
    let store = MemoryDocumentStore::new();
    let origin = AreaId::random();
    let document = stored_document(&store, "OF-2024-004", origin).await;

    let first = pending_towards(&document, AreaId::random());
    let derived = document.with_status(DocumentStatus::Derived, Utc::now());
    let committed = store
        .commit_transition(TransitionCommit {
            document: derived,
            new_derivation: Some(first),
            decided_derivation: None,
            audit: transition_audit(&document, DocumentStatus::Derived),
        })
        .await
        .expect("first derivation commits");

    let second = pending_towards(&committed, AreaId::random());
    let err = store
        .commit_transition(TransitionCommit {
            document: committed.with_status(DocumentStatus::Derived, Utc::now()),
            new_derivation: Some(second),
            decided_derivation: None,
            audit: transition_audit(&committed, DocumentStatus::Derived),
        })
        .await
        .expect_err("second pending derivation must conflict");

    assert!(matches!(err, DocumentStoreError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn commit_transition_rejects_deciding_a_decided_derivation() {
    let store = MemoryDocumentStore::new();
    let document = stored_document(&store, "OF-2024-005", AreaId::random()).await;
    let destination = AreaId::random();
    let decider = UserId::random();

    let pending = pending_towards(&document, destination);
    let derived = store
        .commit_transition(TransitionCommit {
            document: document.with_status(DocumentStatus::Derived, Utc::now()),
            new_derivation: Some(pending.clone()),
            decided_derivation: None,
            audit: transition_audit(&document, DocumentStatus::Derived),
        })
        .await
        .expect("derivation commits");

    let accepted = pending.accepted(decider.clone(), Utc::now());
    let moved = store
        .commit_transition(TransitionCommit {
            document: derived.moved_to(destination, DocumentStatus::InReview, Utc::now()),
            new_derivation: None,
            decided_derivation: Some(accepted.clone()),
            audit: transition_audit(&derived, DocumentStatus::InReview),
        })
        .await
        .expect("acceptance commits");

    // Deciding the same derivation again must fail even with a fresh
    // document version.
    let err = store
        .commit_transition(TransitionCommit {
            document: moved.with_status(DocumentStatus::InReview, Utc::now()),
            new_derivation: None,
            decided_derivation: Some(pending.accepted(decider, Utc::now())),
            audit: transition_audit(&moved, DocumentStatus::InReview),
        })
        .await
        .expect_err("double decision must conflict");

    assert!(matches!(err, DocumentStoreError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn area_inbox_lists_pending_for_that_area_oldest_first() {
    let store = MemoryDocumentStore::new();
    let destination = AreaId::random();
    let other_area = AreaId::random();

    let first_doc = stored_document(&store, "OF-2024-006", AreaId::random()).await;
    let second_doc = stored_document(&store, "OF-2024-007", AreaId::random()).await;
    let elsewhere_doc = stored_document(&store, "OF-2024-008", AreaId::random()).await;

    for (document, target) in [
        (&first_doc, destination),
        (&second_doc, destination),
        (&elsewhere_doc, other_area),
    ] {
        store
            .commit_transition(TransitionCommit {
                document: document.with_status(DocumentStatus::Derived, Utc::now()),
                new_derivation: Some(pending_towards(document, target)),
                decided_derivation: None,
                audit: transition_audit(document, DocumentStatus::Derived),
            })
            .await
            .expect("derivation commits");
    }

    let inbox = store.area_inbox(destination).await.expect("inbox loads");

    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].document.id(), first_doc.id());
    assert_eq!(inbox[1].document.id(), second_doc.id());
    assert!(
        inbox
            .iter()
            .all(|entry| entry.derivation.destination_area_id() == destination)
    );
}

#[rstest]
#[tokio::test]
async fn audit_trail_filters_by_document_in_commit_order() {
    let store = MemoryDocumentStore::new();
    let document = stored_document(&store, "OF-2024-009", AreaId::random()).await;
    let other = stored_document(&store, "OF-2024-010", AreaId::random()).await;

    store
        .commit_transition(TransitionCommit {
            document: document.with_status(DocumentStatus::InReview, Utc::now()),
            new_derivation: None,
            decided_derivation: None,
            audit: transition_audit(&document, DocumentStatus::InReview),
        })
        .await
        .expect("commit succeeds");

    let trail = store
        .audit_trail(document.id())
        .await
        .expect("trail loads");
    let other_trail = store.audit_trail(other.id()).await.expect("trail loads");

    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].to_status, DocumentStatus::Received);
    assert_eq!(trail[1].to_status, DocumentStatus::InReview);
    assert_eq!(other_trail.len(), 1);
}

mod directory {
    use chrono::Utc;
    use rstest::rstest;

    use super::super::*;
    use crate::domain::user::{FullName, UserDraft};

    fn sample_user(username: &str, role_id: RoleId, area_id: AreaId) -> User {
        let now = Utc::now();
        User::new(UserDraft {
            id: UserId::random(),
            username: Username::new(username).expect("valid username"),
            full_name: FullName::new("Carla Mendoza").expect("valid name"),
            grade: None,
            role_id,
            home_area_id: area_id,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    #[rstest]
    #[tokio::test]
    async fn create_user_rejects_duplicate_username() {
        let directory = MemoryDirectoryRepository::new();
        let role_id = RoleId::random();
        let area_id = AreaId::random();
        let hash = PasswordHash::derive("s3cret");

        directory
            .create_user(&sample_user("cmendoza", role_id, area_id), &hash)
            .await
            .expect("first create succeeds");
        let err = directory
            .create_user(&sample_user("cmendoza", role_id, area_id), &hash)
            .await
            .expect_err("duplicate username must conflict");

        assert!(matches!(err, DirectoryRepositoryError::Conflict { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn update_user_keeps_stored_password() {
        let directory = MemoryDirectoryRepository::new();
        let user = sample_user("cmendoza", RoleId::random(), AreaId::random());
        directory
            .create_user(&user, &PasswordHash::derive("s3cret"))
            .await
            .expect("create succeeds");

        let deactivated = user.deactivated(Utc::now());
        directory
            .update_user(&deactivated)
            .await
            .expect("update succeeds");

        let (found, hash) = directory
            .find_user_by_username(user.username())
            .await
            .expect("lookup succeeds")
            .expect("user exists");
        assert!(!found.is_active());
        assert!(hash.verify("s3cret"));
    }

    #[rstest]
    #[tokio::test]
    async fn update_user_requires_an_existing_row() {
        let directory = MemoryDirectoryRepository::new();
        let ghost = sample_user("nadie", RoleId::random(), AreaId::random());

        let err = directory
            .update_user(&ghost)
            .await
            .expect_err("unknown user must be missing");

        assert!(matches!(err, DirectoryRepositoryError::Missing { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn list_users_sorts_by_username() {
        let directory = MemoryDirectoryRepository::new();
        let role_id = RoleId::random();
        let area_id = AreaId::random();
        for username in ["zvaldez", "amunoz", "cmendoza"] {
            directory
                .create_user(
                    &sample_user(username, role_id, area_id),
                    &PasswordHash::derive("s3cret"),
                )
                .await
                .expect("create succeeds");
        }

        let users = directory.list_users().await.expect("listing succeeds");
        let names: Vec<&str> = users.iter().map(|user| user.username().as_ref()).collect();

        assert_eq!(names, ["amunoz", "cmendoza", "zvaldez"]);
    }
}
