//! Directory administration handlers: users, roles, and areas.
//!
//! ```text
//! POST /api/v1/users {"username":"jquispe","fullName":"Julia Quispe",...}
//! PUT /api/v1/users/{id}
//! POST /api/v1/users/{id}/deactivate
//! GET /api/v1/users
//! GET /api/v1/roles
//! GET /api/v1/areas
//! ```
//!
//! Accounts are never deleted; deactivation keeps the row so audit entries
//! stay attributable.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::{
    Area, CreateUserRequest, Error, FullName, Grade, Role, RoleId, UpdateUserRequest, User,
    UserId, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, parse_uuid};

use crate::domain::AreaId;

/// Account payload returned by the directory endpoints.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub role_id: Uuid,
    pub home_area_id: Uuid,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            username: user.username().as_ref().to_owned(),
            full_name: user.full_name().as_ref().to_owned(),
            grade: user.grade().map(|grade| grade.as_ref().to_owned()),
            role_id: *user.role_id().as_uuid(),
            home_area_id: *user.home_area_id().as_uuid(),
            active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Role catalogue entry returned by `GET /api/v1/roles`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub access_level: i16,
    /// Named capabilities the role grants.
    pub capabilities: Vec<String>,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            id: *role.id().as_uuid(),
            name: role.name().as_ref().to_owned(),
            access_level: role.access_level(),
            capabilities: role
                .capabilities()
                .iter()
                .map(|capability| capability.as_str().to_owned())
                .collect(),
        }
    }
}

/// Area catalogue entry returned by `GET /api/v1/areas`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub active: bool,
}

impl From<&Area> for AreaResponse {
    fn from(area: &Area) -> Self {
        Self {
            id: *area.id().as_uuid(),
            name: area.name().as_ref().to_owned(),
            code: area.code().as_ref().to_owned(),
            active: area.is_active(),
        }
    }
}

/// Body for `POST /api/v1/users`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub grade: Option<String>,
    pub role_id: String,
    pub home_area_id: String,
    pub password: String,
}

/// Body for `PUT /api/v1/users/{id}`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub full_name: String,
    #[serde(default)]
    pub grade: Option<String>,
    pub role_id: String,
    pub home_area_id: String,
}

fn parse_grade(grade: Option<String>) -> Result<Option<Grade>, Error> {
    grade
        .map(|raw| Grade::new(raw).map_err(|err| invalid_field_error(FieldName::new("grade"), err)))
        .transpose()
}

fn parse_profile_ids(role_id: &str, home_area_id: &str) -> Result<(RoleId, AreaId), Error> {
    let role_id = RoleId::from_uuid(parse_uuid(role_id, FieldName::new("roleId"))?);
    let home_area_id = AreaId::from_uuid(parse_uuid(home_area_id, FieldName::new("homeAreaId"))?);
    Ok((role_id, home_area_id))
}

fn parse_user_path(id: &str) -> Result<UserId, Error> {
    Ok(UserId::from_uuid(parse_uuid(id, FieldName::new("userId"))?))
}

/// Provision a new account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Role or area not found", body = Error),
        (status = 409, description = "Username already taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["directory"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let body = payload.into_inner();
    let (role_id, home_area_id) = parse_profile_ids(&body.role_id, &body.home_area_id)?;
    let request = CreateUserRequest {
        username: Username::new(body.username)
            .map_err(|err| invalid_field_error(FieldName::new("username"), err))?,
        full_name: FullName::new(body.full_name)
            .map_err(|err| invalid_field_error(FieldName::new("fullName"), err))?,
        grade: parse_grade(body.grade)?,
        role_id,
        home_area_id,
        password: Zeroizing::new(body.password),
    };

    let user = state
        .directory
        .create_user(&caller, request)
        .await
        .map_err(Error::from)?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Replace an account's profile fields.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "User, role, or area not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["directory"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserBody>,
) -> ApiResult<web::Json<UserResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let user_id = parse_user_path(&path.into_inner())?;
    let body = payload.into_inner();
    let (role_id, home_area_id) = parse_profile_ids(&body.role_id, &body.home_area_id)?;
    let request = UpdateUserRequest {
        full_name: FullName::new(body.full_name)
            .map_err(|err| invalid_field_error(FieldName::new("fullName"), err))?,
        grade: parse_grade(body.grade)?,
        role_id,
        home_area_id,
    };

    let user = state
        .directory
        .update_user(&caller, &user_id, request)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Deactivate an account. Deactivating an already inactive account returns
/// the unchanged profile.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/deactivate",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deactivated", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["directory"],
    operation_id = "deactivateUser"
)]
#[post("/users/{id}/deactivate")]
pub async fn deactivate_user(
    session: SessionContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let user_id = parse_user_path(&path.into_inner())?;

    let user = state
        .directory
        .deactivate_user(&caller, &user_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// List all accounts, active and inactive.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Accounts", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["directory"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let caller = session.require_identity(state.identity.as_ref()).await?;
    let users = state
        .directory
        .list_users(&caller)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}

/// The role catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses(
        (status = 200, description = "Roles", body = [RoleResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["directory"],
    operation_id = "listRoles"
)]
#[get("/roles")]
pub async fn list_roles(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<RoleResponse>>> {
    session.require_identity(state.identity.as_ref()).await?;
    let roles = state.directory.list_roles().await.map_err(Error::from)?;
    Ok(web::Json(roles.iter().map(RoleResponse::from).collect()))
}

/// The area catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/areas",
    responses(
        (status = 200, description = "Areas", body = [AreaResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["directory"],
    operation_id = "listAreas"
)]
#[get("/areas")]
pub async fn list_areas(
    session: SessionContext,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<AreaResponse>>> {
    session.require_identity(state.identity.as_ref()).await?;
    let areas = state.directory.list_areas().await.map_err(Error::from)?;
    Ok(web::Json(areas.iter().map(AreaResponse::from).collect()))
}
