//! Directory administration: users, roles, and areas.
//!
//! Accounts are provisioned and amended here, never deleted; deactivation
//! keeps the row so the audit trail stays attributable. All mutations are
//! gated on [`Capability::ManageDirectory`].

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::area::{Area, AreaId};
use crate::domain::auth::PasswordHash;
use crate::domain::error::Error as DomainError;
use crate::domain::identity::CallerIdentity;
use crate::domain::permissions::Capability;
use crate::domain::ports::{DirectoryRepository, DirectoryRepositoryError};
use crate::domain::role::{Role, RoleId};
use crate::domain::user::{FullName, Grade, User, UserDraft, UserId, Username};

/// Failure modes of a directory operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Caller lacks the manage capability.
    #[error("{message}")]
    PermissionDenied { message: String },
    /// A supplied field failed validation.
    #[error("{message}")]
    Validation { message: String },
    /// The referenced user, role, or area does not exist.
    #[error("{message}")]
    NotFound { message: String },
    /// A uniqueness rule was violated.
    #[error("{message}")]
    Conflict { message: String },
    /// The directory store failed; nothing was written.
    #[error("persistence failure: {source}")]
    Persistence { source: DomainError },
}

impl DirectoryError {
    fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<DirectoryError> for DomainError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::PermissionDenied { message } => DomainError::forbidden(message),
            DirectoryError::Validation { message } => DomainError::invalid_request(message),
            DirectoryError::NotFound { message } => DomainError::not_found(message),
            DirectoryError::Conflict { message } => DomainError::conflict(message),
            DirectoryError::Persistence { source } => source,
        }
    }
}

fn map_repository_error(error: DirectoryRepositoryError) -> DirectoryError {
    match error {
        DirectoryRepositoryError::Conflict { message } => DirectoryError::Conflict { message },
        DirectoryRepositoryError::Missing { message } => DirectoryError::NotFound { message },
        DirectoryRepositoryError::Connection { message } => DirectoryError::Persistence {
            source: DomainError::service_unavailable(format!("directory unavailable: {message}")),
        },
        DirectoryRepositoryError::Query { message } => DirectoryError::Persistence {
            source: DomainError::internal(format!("directory error: {message}")),
        },
    }
}

/// Fields required to provision a new account.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: Username,
    pub full_name: FullName,
    pub grade: Option<Grade>,
    pub role_id: RoleId,
    pub home_area_id: AreaId,
    pub password: Zeroizing<String>,
}

/// Fields an administrator may change on an existing account.
#[derive(Debug, Clone)]
pub struct UpdateUserRequest {
    pub full_name: FullName,
    pub grade: Option<Grade>,
    pub role_id: RoleId,
    pub home_area_id: AreaId,
}

/// Domain service for user, role, and area administration.
pub struct DirectoryService<R: ?Sized> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

// Derived `Clone` would demand `R: Clone` even though only the handles are
// cloned.
impl<R: ?Sized> Clone for DirectoryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: ?Sized> DirectoryService<R> {
    /// Create a directory service over the given repository.
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

impl<R> DirectoryService<R>
where
    R: DirectoryRepository + ?Sized,
{
    /// Provision a new active account. Requires
    /// [`Capability::ManageDirectory`]; role and home area must exist.
    pub async fn create_user(
        &self,
        caller: &CallerIdentity,
        request: CreateUserRequest,
    ) -> Result<User, DirectoryError> {
        self.require_manage(caller)?;
        if request.password.is_empty() {
            return Err(DirectoryError::Validation {
                message: "password must not be empty".to_owned(),
            });
        }
        self.require_role(request.role_id).await?;
        self.require_area(request.home_area_id).await?;

        let now = self.clock.utc();
        let user = User::new(UserDraft {
            id: UserId::random(),
            username: request.username,
            full_name: request.full_name,
            grade: request.grade,
            role_id: request.role_id,
            home_area_id: request.home_area_id,
            active: true,
            created_at: now,
            updated_at: now,
        });
        let hash = PasswordHash::derive(request.password.as_str());

        self.repository
            .create_user(&user, &hash)
            .await
            .map_err(map_repository_error)?;
        Ok(user)
    }

    /// Replace an account's profile fields. Requires
    /// [`Capability::ManageDirectory`]; role and home area must exist.
    pub async fn update_user(
        &self,
        caller: &CallerIdentity,
        user_id: &UserId,
        request: UpdateUserRequest,
    ) -> Result<User, DirectoryError> {
        self.require_manage(caller)?;
        let user = self.require_user(user_id).await?;
        self.require_role(request.role_id).await?;
        self.require_area(request.home_area_id).await?;

        let updated = user.with_profile(
            request.full_name,
            request.grade,
            request.role_id,
            request.home_area_id,
            self.clock.utc(),
        );
        self.repository
            .update_user(&updated)
            .await
            .map_err(map_repository_error)?;
        Ok(updated)
    }

    /// Deactivate an account, keeping the row. Deactivating an already
    /// inactive account succeeds without writing.
    pub async fn deactivate_user(
        &self,
        caller: &CallerIdentity,
        user_id: &UserId,
    ) -> Result<User, DirectoryError> {
        self.require_manage(caller)?;
        let user = self.require_user(user_id).await?;
        if !user.is_active() {
            return Ok(user);
        }

        let deactivated = user.deactivated(self.clock.utc());
        self.repository
            .update_user(&deactivated)
            .await
            .map_err(map_repository_error)?;
        Ok(deactivated)
    }

    /// The caller's own profile.
    pub async fn profile(&self, caller: &CallerIdentity) -> Result<User, DirectoryError> {
        self.require_user(caller.user_id()).await
    }

    /// All accounts, active and inactive. Requires
    /// [`Capability::ManageDirectory`].
    pub async fn list_users(&self, caller: &CallerIdentity) -> Result<Vec<User>, DirectoryError> {
        self.require_manage(caller)?;
        self.repository
            .list_users()
            .await
            .map_err(map_repository_error)
    }

    /// The role catalogue, readable by any authenticated caller.
    pub async fn list_roles(&self) -> Result<Vec<Role>, DirectoryError> {
        self.repository
            .list_roles()
            .await
            .map_err(map_repository_error)
    }

    /// The area catalogue, readable by any authenticated caller.
    pub async fn list_areas(&self) -> Result<Vec<Area>, DirectoryError> {
        self.repository
            .list_areas()
            .await
            .map_err(map_repository_error)
    }

    fn require_manage(&self, caller: &CallerIdentity) -> Result<(), DirectoryError> {
        if caller.can(Capability::ManageDirectory) {
            Ok(())
        } else {
            Err(DirectoryError::permission_denied(
                "directory administration requires the manage capability",
            ))
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User, DirectoryError> {
        self.repository
            .find_user(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| DirectoryError::not_found(format!("user {id} does not exist")))
    }

    async fn require_role(&self, id: RoleId) -> Result<Role, DirectoryError> {
        self.repository
            .find_role(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| DirectoryError::not_found(format!("role {id} does not exist")))
    }

    async fn require_area(&self, id: AreaId) -> Result<Area, DirectoryError> {
        self.repository
            .find_area(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| DirectoryError::not_found(format!("area {id} does not exist")))
    }
}
