//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define the strongly typed model of the derivation workflow and
//! the services acting on it. Keep types immutable, validate at
//! construction, and document invariants and serialisation contracts in
//! each type's Rustdoc.
//!
//! Public surface (most used):
//! - `Error` / `ErrorCode` — transport-agnostic error payload.
//! - `TraceId` — per-request trace identifier carried in a task-local.
//! - `Capability` / `CapabilitySet` — named permissions over a bitmask.
//! - `CallerIdentity` — resolved identity passed into every operation.
//! - `Document` / `Derivation` / `AuditEntry` — workflow aggregates.
//! - `DerivationWorkflow` — the state machine executing transitions.
//! - `DirectoryService` — user, role, and area administration.
//! - `ports` — hexagonal boundary traits implemented by adapters.

pub mod area;
pub mod audit;
pub mod auth;
pub mod derivation;
pub mod directory;
pub mod document;
pub mod error;
pub mod identity;
pub mod permissions;
pub mod ports;
pub mod role;
pub mod trace_id;
pub mod user;
pub mod workflow;

pub use self::area::{Area, AreaCode, AreaId, AreaName, AreaValidationError};
pub use self::audit::{AuditEntry, WorkflowAction};
pub use self::auth::{InvalidPasswordHash, LoginCredentials, LoginValidationError, PasswordHash};
pub use self::derivation::{
    AreaInboxEntry, Derivation, DerivationId, DerivationStatus, DerivationValidationError, Reason,
};
pub use self::directory::{
    CreateUserRequest, DirectoryError, DirectoryService, UpdateUserRequest,
};
pub use self::document::{
    Document, DocumentCode, DocumentId, DocumentKind, DocumentStatus, DocumentValidationError,
    Subject,
};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::identity::CallerIdentity;
pub use self::permissions::{Capability, CapabilitySet};
pub use self::role::{Role, RoleId, RoleName, RoleValidationError};
pub use self::trace_id::TraceId;
pub use self::user::{FullName, Grade, User, UserDraft, UserId, UserValidationError, Username};
pub use self::workflow::{
    DerivationOutcome, DerivationWorkflow, DeriveDocumentRequest, RegisterDocumentRequest,
    WorkflowError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
