//! Builders wiring persistence adapters into the HTTP state.
//!
//! The server runs over the Diesel adapters when a database pool is
//! configured and over the in-memory pair otherwise. The in-memory directory
//! is seeded with the standard roles, two areas, and a development
//! administrator account so a database-free instance is usable immediately.

use std::sync::Arc;

use actix_web::web;
use chrono::Utc;
use mockable::DefaultClock;
use tracing::warn;
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
use crate::outbound::persistence::{
    DieselDirectoryRepository, DieselDocumentStore, MemoryDirectoryRepository, MemoryDocumentStore,
};

use super::ServerConfig;

/// Credentials of the development administrator seeded into the in-memory
/// directory. Never used when a database pool is configured.
const DEV_ADMIN_USERNAME: &str = "admin";
const DEV_ADMIN_PASSWORD: &str = "password";

/// Adapter set the domain services are built over.
struct Adapters {
    store: Arc<dyn DocumentStore>,
    directory: Arc<dyn DirectoryRepository>,
    login: Arc<dyn LoginService>,
    identity: Arc<dyn IdentityResolver>,
}

fn diesel_adapters(config: &ServerConfig) -> Option<Adapters> {
    let pool = config.db_pool.as_ref()?;
    let directory = Arc::new(DieselDirectoryRepository::new(pool.clone()));
    Some(Adapters {
        store: Arc::new(DieselDocumentStore::new(pool.clone())),
        directory: Arc::clone(&directory) as Arc<dyn DirectoryRepository>,
        login: Arc::new(DirectoryLoginService::new(Arc::clone(&directory))),
        identity: Arc::new(DirectoryIdentityResolver::new(directory)),
    })
}

fn seed_role(
    directory: &MemoryDirectoryRepository,
    name: &str,
    capabilities: CapabilitySet,
) -> Option<RoleId> {
    let role_name = match RoleName::new(name) {
        Ok(role_name) => role_name,
        Err(error) => {
            warn!(role = name, error = %error, "skipping invalid seed role");
            return None;
        }
    };
    let id = RoleId::random();
    match directory.seed_role(Role::new(id, role_name, 1, capabilities)) {
        Ok(()) => Some(id),
        Err(error) => {
            warn!(role = name, error = %error, "seeding role failed");
            None
        }
    }
}

fn seed_area(directory: &MemoryDirectoryRepository, name: &str, code: &str) -> Option<AreaId> {
    let (area_name, area_code) = match (AreaName::new(name), AreaCode::new(code)) {
        (Ok(area_name), Ok(area_code)) => (area_name, area_code),
        _ => {
            warn!(area = name, "skipping invalid seed area");
            return None;
        }
    };
    let id = AreaId::random();
    match directory.seed_area(Area::new(id, area_name, area_code, true, Utc::now())) {
        Ok(()) => Some(id),
        Err(error) => {
            warn!(area = name, error = %error, "seeding area failed");
            None
        }
    }
}

async fn seed_dev_admin(
    directory: &MemoryDirectoryRepository,
    role_id: RoleId,
    home_area_id: AreaId,
) {
    let (Ok(username), Ok(full_name)) = (
        Username::new(DEV_ADMIN_USERNAME),
        FullName::new("Development Administrator"),
    ) else {
        warn!("development administrator seed is invalid");
        return;
    };
    let now = Utc::now();
    let user = User::new(UserDraft {
        id: UserId::random(),
        username,
        full_name,
        grade: None,
        role_id,
        home_area_id,
        active: true,
        created_at: now,
        updated_at: now,
    });
    let password = Zeroizing::new(DEV_ADMIN_PASSWORD.to_owned());
    if let Err(error) = directory
        .create_user(&user, &PasswordHash::derive(&password))
        .await
    {
        warn!(error = %error, "seeding the development administrator failed");
    }
}

/// Build in-memory adapters seeded with roles, areas, and a development
/// administrator.
async fn memory_adapters() -> Adapters {
    warn!("no database configured; using an in-memory store with development credentials");
    let store = Arc::new(MemoryDocumentStore::new());
    let directory = Arc::new(MemoryDirectoryRepository::new());

    let admin_role = seed_role(
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
    seed_role(
        &directory,
        "Mesa de Partes",
        CapabilitySet::from_iter([
            Capability::CreateDocuments,
            Capability::EditDocuments,
            Capability::DeriveDocuments,
        ]),
    );
    seed_role(
        &directory,
        "Auditor",
        CapabilitySet::from_iter([Capability::ReadAuditTrail]),
    );
    let intake_area = seed_area(&directory, "Mesa de Partes", "MP");
    seed_area(&directory, "Toxicologia", "TOX");
    if let (Some(role_id), Some(home_area_id)) = (admin_role, intake_area) {
        seed_dev_admin(&directory, role_id, home_area_id).await;
    }

    Adapters {
        store,
        directory: Arc::clone(&directory) as Arc<dyn DirectoryRepository>,
        login: Arc::new(DirectoryLoginService::new(Arc::clone(&directory))),
        identity: Arc::new(DirectoryIdentityResolver::new(directory)),
    }
}

/// Build the HTTP state from the configured persistence backend.
pub(crate) async fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let adapters = match diesel_adapters(config) {
        Some(adapters) => adapters,
        None => memory_adapters().await,
    };

    let clock: Arc<dyn mockable::Clock> = Arc::new(DefaultClock);
    let workflow = DerivationWorkflow::new(
        Arc::clone(&adapters.store),
        Arc::clone(&adapters.directory),
        Arc::new(LoggingDerivationNotifier),
        Arc::clone(&clock),
    );
    let directory_service = DirectoryService::new(adapters.directory, clock);

    web::Data::new(HttpState::new(
        adapters.login,
        adapters.identity,
        workflow,
        directory_service,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoginCredentials;

    #[tokio::test]
    async fn memory_adapters_seed_a_working_admin_login() {
        let adapters = memory_adapters().await;
        let credentials = LoginCredentials::try_from_parts(DEV_ADMIN_USERNAME, DEV_ADMIN_PASSWORD)
            .expect("valid dev credentials");
        let user_id = adapters
            .login
            .authenticate(&credentials)
            .await
            .expect("seeded admin can log in");

        let identity = adapters
            .identity
            .resolve(&user_id)
            .await
            .expect("seeded admin resolves");
        assert!(identity.can(Capability::ManageDirectory));
    }

    #[tokio::test]
    async fn unknown_users_do_not_resolve() {
        let adapters = memory_adapters().await;
        assert!(adapters.identity.resolve(&UserId::random()).await.is_err());
    }
}
