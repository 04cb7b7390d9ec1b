//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (sessions,
//!   documents, derivations, directory administration, health)
//! - **Schemas**: Request and response bodies from the handler modules plus
//!   the shared error envelope
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is served by Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::derivations::{
    AreaInboxEntryResponse, DerivationOutcomeResponse, DerivationResponse,
};
use crate::inbound::http::directory::{
    AreaResponse, CreateUserBody, RoleResponse, UpdateUserBody, UserResponse,
};
use crate::inbound::http::documents::{
    AuditEntryResponse, DeriveDocumentBody, DocumentResponse, RegisterDocumentBody, RejectBody,
};
use crate::inbound::http::users::{LoginRequest, MeResponse};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Tramite backend API",
        description = "HTTP interface for document registration, derivation \
                       between areas, and directory administration.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::me,
        crate::inbound::http::documents::register_document,
        crate::inbound::http::documents::get_document,
        crate::inbound::http::documents::document_audit,
        crate::inbound::http::documents::start_review,
        crate::inbound::http::documents::derive_document,
        crate::inbound::http::documents::close_document,
        crate::inbound::http::documents::reject_document,
        crate::inbound::http::derivations::accept_derivation,
        crate::inbound::http::derivations::reject_derivation,
        crate::inbound::http::derivations::area_pending_derivations,
        crate::inbound::http::directory::create_user,
        crate::inbound::http::directory::update_user,
        crate::inbound::http::directory::deactivate_user,
        crate::inbound::http::directory::list_users,
        crate::inbound::http::directory::list_roles,
        crate::inbound::http::directory::list_areas,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginRequest,
        MeResponse,
        UserResponse,
        RoleResponse,
        AreaResponse,
        CreateUserBody,
        UpdateUserBody,
        DocumentResponse,
        AuditEntryResponse,
        RegisterDocumentBody,
        DeriveDocumentBody,
        RejectBody,
        DerivationResponse,
        DerivationOutcomeResponse,
        AreaInboxEntryResponse,
    )),
    tags(
        (name = "sessions", description = "Login, logout, and caller profile"),
        (name = "documents", description = "Document lifecycle operations"),
        (name = "derivations", description = "Derivation decisions and area inboxes"),
        (name = "directory", description = "User, role, and area administration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
