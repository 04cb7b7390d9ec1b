//! Shared harness for HTTP integration tests.
//!
//! Assembles the full application the way the server does — session
//! middleware, trace middleware, the `/api/v1` scope, and health probes —
//! over seeded in-memory adapters.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use chrono::Utc;
use mockable::DefaultClock;
use zeroize::Zeroizing;

use backend::Trace;
use backend::domain::ports::{
    DirectoryIdentityResolver, DirectoryLoginService, DirectoryRepository, DocumentStore,
    IdentityResolver, LoggingDerivationNotifier, LoginService,
};
use backend::domain::{
    Area, AreaCode, AreaId, AreaName, Capability, CapabilitySet, DerivationWorkflow,
    DirectoryService, FullName, PasswordHash, Role, RoleId, RoleName, User, UserDraft, UserId,
    Username,
};
use backend::inbound::http::health::HealthState;
use backend::inbound::http::state::HttpState;
use backend::inbound::http::{derivations, directory, documents, health, users};
use backend::outbound::persistence::{MemoryDirectoryRepository, MemoryDocumentStore};

/// Password shared by every account the harness provisions.
pub const TEST_PASSWORD: &str = "correct-horse";

/// Seeded in-memory backend plus the ids the scenarios route against.
pub struct TestBackend {
    pub state: HttpState,
    pub health: web::Data<HealthState>,
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

impl TestBackend {
    /// Build the state over fresh in-memory adapters with the standard role
    /// trio and two areas seeded.
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
            health: web::Data::new(HealthState::new()),
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

    /// Assemble the application exactly as the server wires it, minus the
    /// Swagger UI.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();

        let api = web::scope("/api/v1")
            .wrap(session)
            .service(users::login)
            .service(users::logout)
            .service(users::me)
            .service(documents::register_document)
            .service(documents::get_document)
            .service(documents::document_audit)
            .service(documents::start_review)
            .service(documents::derive_document)
            .service(documents::close_document)
            .service(documents::reject_document)
            .service(derivations::accept_derivation)
            .service(derivations::reject_derivation)
            .service(derivations::area_pending_derivations)
            .service(directory::create_user)
            .service(directory::update_user)
            .service(directory::deactivate_user)
            .service(directory::list_users)
            .service(directory::list_roles)
            .service(directory::list_areas);

        App::new()
            .app_data(self.health.clone())
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Trace)
            .service(api)
            .service(health::ready)
            .service(health::live)
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Log in as `username` and return the session cookie.
pub async fn login_cookie(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    username: &str,
) -> Cookie<'static> {
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(serde_json::json!({
                "username": username,
                "password": TEST_PASSWORD,
            }))
            .to_request(),
    )
    .await;
    assert!(response.status().is_success(), "login must succeed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
