//! Derivation decision handlers and the area inbox.
//!
//! ```text
//! POST /api/v1/derivations/{id}/accept
//! POST /api/v1/derivations/{id}/reject {"reason":"no corresponde"}
//! GET /api/v1/areas/{id}/derivations/pending
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AreaId, AreaInboxEntry, Derivation, DerivationId, DerivationOutcome, Error,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::documents::{DocumentResponse, RejectBody, parse_reason};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Derivation payload returned by the workflow endpoints.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivationResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub source_area_id: Uuid,
    pub destination_area_id: Uuid,
    pub status: String,
    pub requested_by: Uuid,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,
}

impl From<&Derivation> for DerivationResponse {
    fn from(derivation: &Derivation) -> Self {
        Self {
            id: *derivation.id().as_uuid(),
            document_id: *derivation.document_id().as_uuid(),
            source_area_id: *derivation.source_area_id().as_uuid(),
            destination_area_id: *derivation.destination_area_id().as_uuid(),
            status: derivation.status().as_str().to_owned(),
            requested_by: *derivation.requested_by().as_uuid(),
            requested_at: derivation.requested_at(),
            decided_by: derivation.decided_by().map(|id| *id.as_uuid()),
            decided_at: derivation.decided_at(),
            decision_reason: derivation
                .decision_reason()
                .map(|reason| reason.as_ref().to_owned()),
        }
    }
}

/// A document and the derivation touched by the same commit.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivationOutcomeResponse {
    pub document: DocumentResponse,
    pub derivation: DerivationResponse,
}

impl From<&DerivationOutcome> for DerivationOutcomeResponse {
    fn from(outcome: &DerivationOutcome) -> Self {
        Self {
            document: DocumentResponse::from(&outcome.document),
            derivation: DerivationResponse::from(&outcome.derivation),
        }
    }
}

/// One pending derivation in an area's inbox, paired with its document.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaInboxEntryResponse {
    pub derivation: DerivationResponse,
    pub document: DocumentResponse,
}

impl From<&AreaInboxEntry> for AreaInboxEntryResponse {
    fn from(entry: &AreaInboxEntry) -> Self {
        Self {
            derivation: DerivationResponse::from(&entry.derivation),
            document: DocumentResponse::from(&entry.document),
        }
    }
}

fn parse_derivation_path(id: &str) -> Result<DerivationId, Error> {
    Ok(DerivationId::from_uuid(parse_uuid(
        id,
        FieldName::new("derivationId"),
    )?))
}

/// Accept a pending derivation; the document moves to the destination area
/// and re-enters review there.
#[utoipa::path(
    post,
    path = "/api/v1/derivations/{id}/accept",
    params(("id" = String, Path, description = "Derivation id")),
    responses(
        (status = 200, description = "Derivation accepted", body = DerivationOutcomeResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Derivation not found", body = Error),
        (status = 409, description = "Derivation already decided or lost a race", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["derivations"],
    operation_id = "acceptDerivation"
)]
#[post("/derivations/{id}/accept")]
pub async fn accept_derivation(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DerivationOutcomeResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let derivation_id = parse_derivation_path(&path.into_inner())?;

    let outcome = state
        .workflow
        .accept_derivation(&caller, derivation_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(DerivationOutcomeResponse::from(&outcome)))
}

/// Reject a pending derivation; the document stays at its source area and
/// reverts to review.
#[utoipa::path(
    post,
    path = "/api/v1/derivations/{id}/reject",
    params(("id" = String, Path, description = "Derivation id")),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Derivation rejected", body = DerivationOutcomeResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Derivation not found", body = Error),
        (status = 409, description = "Derivation already decided or lost a race", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["derivations"],
    operation_id = "rejectDerivation"
)]
#[post("/derivations/{id}/reject")]
pub async fn reject_derivation(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RejectBody>,
) -> ApiResult<web::Json<DerivationOutcomeResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let derivation_id = parse_derivation_path(&path.into_inner())?;
    let reason = parse_reason(payload.into_inner().reason)?;

    let outcome = state
        .workflow
        .reject_derivation(&caller, derivation_id, reason)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(DerivationOutcomeResponse::from(&outcome)))
}

/// Pending derivations routed to an area, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/areas/{id}/derivations/pending",
    params(("id" = String, Path, description = "Area id")),
    responses(
        (status = 200, description = "Pending inbox", body = [AreaInboxEntryResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["derivations"],
    operation_id = "areaPendingDerivations"
)]
#[get("/areas/{id}/derivations/pending")]
pub async fn area_pending_derivations(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<AreaInboxEntryResponse>>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let area_id = AreaId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("areaId"))?);

    let entries = state
        .workflow
        .pending_inbox(&caller, area_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(
        entries.iter().map(AreaInboxEntryResponse::from).collect(),
    ))
}
