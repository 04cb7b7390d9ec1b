//! Document lifecycle handlers.
//!
//! ```text
//! POST /api/v1/documents {"code":"OF-2026-0042","kind":"official",...}
//! GET /api/v1/documents/{id}
//! GET /api/v1/documents/{id}/audit
//! POST /api/v1/documents/{id}/review
//! POST /api/v1/documents/{id}/derivations
//! POST /api/v1/documents/{id}/close
//! POST /api/v1/documents/{id}/reject
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AreaId, AuditEntry, DeriveDocumentRequest, Document, DocumentCode, DocumentId, Error, Reason,
    RegisterDocumentRequest, Subject,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::derivations::DerivationOutcomeResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, parse_enum, parse_uuid};

/// Document payload returned by the workflow endpoints.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub subject: String,
    pub status: String,
    pub origin_area_id: Uuid,
    pub current_area_id: Uuid,
    pub registered_by: Uuid,
    pub registered_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Optimistic concurrency version; increments per committed transition.
    pub version: i64,
}

impl From<&Document> for DocumentResponse {
    fn from(document: &Document) -> Self {
        Self {
            id: *document.id().as_uuid(),
            code: document.code().as_ref().to_owned(),
            kind: document.kind().as_str().to_owned(),
            subject: document.subject().as_ref().to_owned(),
            status: document.status().as_str().to_owned(),
            origin_area_id: *document.origin_area_id().as_uuid(),
            current_area_id: *document.current_area_id().as_uuid(),
            registered_by: *document.registered_by().as_uuid(),
            registered_at: document.registered_at(),
            updated_at: document.updated_at(),
            version: document.version(),
        }
    }
}

/// One committed transition from the audit trail.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryResponse {
    pub document_id: Uuid,
    pub actor: Uuid,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    pub to_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_area_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_area_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl From<&AuditEntry> for AuditEntryResponse {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            document_id: *entry.document_id.as_uuid(),
            actor: *entry.actor.as_uuid(),
            action: entry.action.as_str().to_owned(),
            from_status: entry.from_status.map(|status| status.as_str().to_owned()),
            to_status: entry.to_status.as_str().to_owned(),
            source_area_id: entry.source_area_id.map(|id| *id.as_uuid()),
            destination_area_id: entry.destination_area_id.map(|id| *id.as_uuid()),
            note: entry.note.as_ref().map(|note| note.as_ref().to_owned()),
            recorded_at: entry.recorded_at,
        }
    }
}

/// Body for `POST /api/v1/documents`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDocumentBody {
    /// Human tracking code; upper-cased on intake.
    pub code: String,
    /// One of `official`, `report`, `request`, `toxicology_case`.
    pub kind: String,
    pub subject: String,
    pub initial_area_id: String,
}

/// Body for `POST /api/v1/documents/{id}/derivations`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeriveDocumentBody {
    pub destination_area_id: String,
}

/// Body carrying a rejection reason.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectBody {
    pub reason: String,
}

pub(crate) fn parse_document_path(id: &str) -> Result<DocumentId, Error> {
    Ok(DocumentId::from_uuid(parse_uuid(
        id,
        FieldName::new("documentId"),
    )?))
}

pub(crate) fn parse_reason(reason: String) -> Result<Reason, Error> {
    Reason::new(reason).map_err(|err| invalid_field_error(FieldName::new("reason"), err))
}

/// Register a new document at its intake area.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = RegisterDocumentBody,
    responses(
        (status = 201, description = "Document registered", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Intake area not found", body = Error),
        (status = 409, description = "Code already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "registerDocument"
)]
#[post("/documents")]
pub async fn register_document(
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: web::Json<RegisterDocumentBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let body = payload.into_inner();
    let request = RegisterDocumentRequest {
        code: DocumentCode::new(body.code)
            .map_err(|err| invalid_field_error(FieldName::new("code"), err))?,
        kind: parse_enum(&body.kind, FieldName::new("kind"))?,
        subject: Subject::new(body.subject)
            .map_err(|err| invalid_field_error(FieldName::new("subject"), err))?,
        initial_area_id: AreaId::from_uuid(parse_uuid(
            &body.initial_area_id,
            FieldName::new("initialAreaId"),
        )?),
    };

    let document = state
        .workflow
        .register(&caller, request)
        .await
        .map_err(Error::from)?;
    Ok(HttpResponse::Created().json(DocumentResponse::from(&document)))
}

/// Fetch a document by id.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Document not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "getDocument"
)]
#[get("/documents/{id}")]
pub async fn get_document(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let document_id = parse_document_path(&path.into_inner())?;

    let document = state
        .workflow
        .document(&caller, document_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(DocumentResponse::from(&document)))
}

/// The document's audit trail in commit order.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/audit",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Audit trail", body = [AuditEntryResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Document not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "documentAuditTrail"
)]
#[get("/documents/{id}/audit")]
pub async fn document_audit(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<AuditEntryResponse>>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let document_id = parse_document_path(&path.into_inner())?;

    let entries = state
        .workflow
        .audit_trail(&caller, document_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(
        entries.iter().map(AuditEntryResponse::from).collect(),
    ))
}

/// Move a received document into review at its holding area.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/review",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document in review", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Document not found", body = Error),
        (status = 409, description = "Transition not allowed or lost a race", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "startReview"
)]
#[post("/documents/{id}/review")]
pub async fn start_review(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let document_id = parse_document_path(&path.into_inner())?;

    let document = state
        .workflow
        .start_review(&caller, document_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(DocumentResponse::from(&document)))
}

/// Request a derivation towards another area.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/derivations",
    params(("id" = String, Path, description = "Document id")),
    request_body = DeriveDocumentBody,
    responses(
        (status = 201, description = "Derivation requested", body = DerivationOutcomeResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Document or area not found", body = Error),
        (status = 409, description = "Transition not allowed or a derivation is already pending", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "deriveDocument"
)]
#[post("/documents/{id}/derivations")]
pub async fn derive_document(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<DeriveDocumentBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let document_id = parse_document_path(&path.into_inner())?;
    let request = DeriveDocumentRequest {
        destination_area_id: AreaId::from_uuid(parse_uuid(
            &payload.into_inner().destination_area_id,
            FieldName::new("destinationAreaId"),
        )?),
    };

    let outcome = state
        .workflow
        .derive(&caller, document_id, request)
        .await
        .map_err(Error::from)?;
    Ok(HttpResponse::Created().json(DerivationOutcomeResponse::from(&outcome)))
}

/// Close a document under review at the caller's area.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/close",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document closed", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Document not found", body = Error),
        (status = 409, description = "Transition not allowed or lost a race", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "closeDocument"
)]
#[post("/documents/{id}/close")]
pub async fn close_document(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let document_id = parse_document_path(&path.into_inner())?;

    let document = state
        .workflow
        .close(&caller, document_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(DocumentResponse::from(&document)))
}

/// Reject a document from any non-terminal status, rejecting a pending
/// derivation in the same commit if one exists.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/reject",
    params(("id" = String, Path, description = "Document id")),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Document rejected", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Document not found", body = Error),
        (status = 409, description = "Document already terminal or lost a race", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "rejectDocument"
)]
#[post("/documents/{id}/reject")]
pub async fn reject_document(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RejectBody>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let document_id = parse_document_path(&path.into_inner())?;
    let reason = parse_reason(payload.into_inner().reason)?;

    let document = state
        .workflow
        .reject(&caller, document_id, reason)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(DocumentResponse::from(&document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};

    use crate::inbound::http::test_utils::{TEST_PASSWORD, TestHarness};
    use crate::inbound::http::users::{LoginRequest, login};

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .app_data(web::Data::new(state))
            .service(
                web::scope("/api/v1")
                    .service(login)
                    .service(register_document)
                    .service(get_document)
                    .service(document_audit)
                    .service(start_review)
                    .service(derive_document)
                    .service(close_document)
                    .service(reject_document),
            )
    }

    async fn login_cookie(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
    ) -> actix_web::cookie::Cookie<'static> {
        let response = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequest {
                    username: username.into(),
                    password: TEST_PASSWORD.into(),
                })
                .to_request(),
        )
        .await;
        assert!(response.status().is_success());
        response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    async fn register(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        cookie: &actix_web::cookie::Cookie<'static>,
        harness: &TestHarness,
        code: &str,
    ) -> Value {
        let response = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/v1/documents")
                .cookie(cookie.clone())
                .set_json(json!({
                    "code": code,
                    "kind": "official",
                    "subject": "Remision de muestras",
                    "initialAreaId": harness.intake_area.to_string(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
        serde_json::from_slice(&actix_test::read_body(response).await).expect("document JSON")
    }

    #[actix_web::test]
    async fn register_normalises_the_code_and_sets_received() {
        let harness = TestHarness::new();
        harness
            .add_user("mperez", harness.clerk_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "mperez").await;

        let document = register(&app, &cookie, &harness, "of-2026-0042").await;
        assert_eq!(document["code"].as_str(), Some("OF-2026-0042"));
        assert_eq!(document["status"].as_str(), Some("received"));
        assert_eq!(document["version"].as_i64(), Some(1));
        assert_eq!(
            document["currentAreaId"].as_str(),
            Some(harness.intake_area.to_string().as_str())
        );
    }

    #[actix_web::test]
    async fn register_rejects_unknown_kind() {
        let harness = TestHarness::new();
        harness
            .add_user("mperez", harness.clerk_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "mperez").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/documents")
                .cookie(cookie)
                .set_json(json!({
                    "code": "OF-2026-0042",
                    "kind": "memo",
                    "subject": "Remision de muestras",
                    "initialAreaId": harness.intake_area.to_string(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let value: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("error payload");
        assert_eq!(value["details"]["field"].as_str(), Some("kind"));
    }

    #[actix_web::test]
    async fn auditor_cannot_register_documents() {
        let harness = TestHarness::new();
        harness
            .add_user("auditor", harness.auditor_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "auditor").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/documents")
                .cookie(cookie)
                .set_json(json!({
                    "code": "OF-2026-0042",
                    "kind": "official",
                    "subject": "Remision de muestras",
                    "initialAreaId": harness.intake_area.to_string(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn review_then_close_walks_the_lifecycle() {
        let harness = TestHarness::new();
        harness
            .add_user("mperez", harness.clerk_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "mperez").await;

        let document = register(&app, &cookie, &harness, "OF-2026-0042").await;
        let id = document["id"].as_str().expect("id").to_owned();

        let review = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/documents/{id}/review"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert!(review.status().is_success());
        let review: Value =
            serde_json::from_slice(&actix_test::read_body(review).await).expect("document JSON");
        assert_eq!(review["status"].as_str(), Some("in_review"));
        assert_eq!(review["version"].as_i64(), Some(2));

        let close = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/documents/{id}/close"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert!(close.status().is_success());
        let close: Value =
            serde_json::from_slice(&actix_test::read_body(close).await).expect("document JSON");
        assert_eq!(close["status"].as_str(), Some("closed"));

        // Terminal documents admit no further transitions.
        let reopen = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/documents/{id}/review"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(reopen.status(), actix_web::http::StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn reject_requires_a_reason() {
        let harness = TestHarness::new();
        harness
            .add_user("mperez", harness.clerk_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "mperez").await;

        let document = register(&app, &cookie, &harness, "OF-2026-0042").await;
        let id = document["id"].as_str().expect("id").to_owned();

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/documents/{id}/reject"))
                .cookie(cookie.clone())
                .set_json(json!({ "reason": "   " }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let rejected = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/documents/{id}/reject"))
                .cookie(cookie)
                .set_json(json!({ "reason": "duplicado de OF-2026-0041" }))
                .to_request(),
        )
        .await;
        assert!(rejected.status().is_success());
        let rejected: Value =
            serde_json::from_slice(&actix_test::read_body(rejected).await).expect("document JSON");
        assert_eq!(rejected["status"].as_str(), Some("rejected"));
    }

    #[actix_web::test]
    async fn audit_trail_requires_the_capability_and_lists_transitions() {
        let harness = TestHarness::new();
        harness
            .add_user("mperez", harness.clerk_role, harness.intake_area)
            .await;
        harness
            .add_user("auditor", harness.auditor_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let clerk = login_cookie(&app, "mperez").await;
        let auditor = login_cookie(&app, "auditor").await;

        let document = register(&app, &clerk, &harness, "OF-2026-0042").await;
        let id = document["id"].as_str().expect("id").to_owned();
        let review = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/documents/{id}/review"))
                .cookie(clerk.clone())
                .to_request(),
        )
        .await;
        assert!(review.status().is_success());

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/documents/{id}/audit"))
                .cookie(clerk)
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let trail = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/documents/{id}/audit"))
                .cookie(auditor)
                .to_request(),
        )
        .await;
        assert!(trail.status().is_success());
        let trail: Value =
            serde_json::from_slice(&actix_test::read_body(trail).await).expect("audit JSON");
        let actions: Vec<&str> = trail
            .as_array()
            .expect("audit array")
            .iter()
            .filter_map(|entry| entry["action"].as_str())
            .collect();
        assert_eq!(actions, ["register", "start_review"]);
    }

    #[actix_web::test]
    async fn missing_document_is_not_found() {
        let harness = TestHarness::new();
        harness
            .add_user("mperez", harness.clerk_role, harness.intake_area)
            .await;
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "mperez").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/documents/{}", uuid::Uuid::new_v4()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
