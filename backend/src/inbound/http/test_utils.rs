//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use chrono::Utc;
use mockable::DefaultClock;
use zeroize::Zeroizing;

use crate::domain::ports::{
    DirectoryIdentityResolver, DirectoryLoginService, DirectoryRepository, DocumentStore,
    IdentityResolver, LoggingDerivationNotifier, LoginService,
};
use crate::domain::{
    Area, AreaCode, AreaId, AreaName, Capability, CapabilitySet, DerivationWorkflow,
    DirectoryService, FullName, PasswordHash, Role, RoleId, RoleName, User, UserDraft, UserId,
    Username,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::{MemoryDirectoryRepository, MemoryDocumentStore};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Password shared by every account the harness provisions.
pub const TEST_PASSWORD: &str = "correct-horse";

/// Seeded in-memory backend plus the ids handler tests route against.
pub struct TestHarness {
    pub state: HttpState,
    pub directory: Arc<MemoryDirectoryRepository>,
    pub admin_role: RoleId,
    pub clerk_role: RoleId,
    pub auditor_role: RoleId,
    pub intake_area: AreaId,
    pub lab_area: AreaId,
}

fn seeded_role(directory: &MemoryDirectoryRepository, name: &str, set: CapabilitySet) -> RoleId {
    let id = RoleId::random();
    directory
        .seed_role(Role::new(
            id,
            RoleName::new(name).expect("valid role name"),
            1,
            set,
        ))
        .expect("seeding a role never fails in memory");
    id
}

fn seeded_area(directory: &MemoryDirectoryRepository, name: &str, code: &str) -> AreaId {
    let id = AreaId::random();
    directory
        .seed_area(Area::new(
            id,
            AreaName::new(name).expect("valid area name"),
            AreaCode::new(code).expect("valid area code"),
            true,
            Utc::now(),
        ))
        .expect("seeding an area never fails in memory");
    id
}

impl TestHarness {
    /// Build an [`HttpState`] over fresh in-memory adapters with two areas
    /// and the standard role trio seeded.
    pub fn new() -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let directory = Arc::new(MemoryDirectoryRepository::new());

        let admin_role = seeded_role(
            &directory,
            "Administrador",
            CapabilitySet::from_iter([
                Capability::CreateDocuments,
                Capability::EditDocuments,
                Capability::DeriveDocuments,
                Capability::ReadAuditTrail,
                Capability::ManageDirectory,
            ]),
        );
        let clerk_role = seeded_role(
            &directory,
            "Mesa de Partes",
            CapabilitySet::from_iter([
                Capability::CreateDocuments,
                Capability::EditDocuments,
                Capability::DeriveDocuments,
            ]),
        );
        let auditor_role = seeded_role(
            &directory,
            "Auditor",
            CapabilitySet::from_iter([Capability::ReadAuditTrail]),
        );
        let intake_area = seeded_area(&directory, "Mesa de Partes", "MP");
        let lab_area = seeded_area(&directory, "Toxicologia", "TOX");

        let store_port: Arc<dyn DocumentStore> = store;
        let directory_port: Arc<dyn DirectoryRepository> = directory.clone();
        let login: Arc<dyn LoginService> =
            Arc::new(DirectoryLoginService::new(Arc::clone(&directory)));
        let identity: Arc<dyn IdentityResolver> =
            Arc::new(DirectoryIdentityResolver::new(Arc::clone(&directory)));
        let workflow = DerivationWorkflow::new(
            store_port,
            Arc::clone(&directory_port),
            Arc::new(LoggingDerivationNotifier),
            Arc::new(DefaultClock),
        );
        let directory_service = DirectoryService::new(directory_port, Arc::new(DefaultClock));

        Self {
            state: HttpState::new(login, identity, workflow, directory_service),
            directory,
            admin_role,
            clerk_role,
            auditor_role,
            intake_area,
            lab_area,
        }
    }

    /// Provision an active account with [`TEST_PASSWORD`].
    pub async fn add_user(&self, username: &str, role_id: RoleId, home_area_id: AreaId) -> UserId {
        let now = Utc::now();
        let user = User::new(UserDraft {
            id: UserId::random(),
            username: Username::new(username).expect("valid username"),
            full_name: FullName::new("Test User").expect("valid name"),
            grade: None,
            role_id,
            home_area_id,
            active: true,
            created_at: now,
            updated_at: now,
        });
        let password = Zeroizing::new(TEST_PASSWORD.to_owned());
        self.directory
            .create_user(&user, &PasswordHash::derive(&password))
            .await
            .expect("user seeding must succeed");
        user.id().clone()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
