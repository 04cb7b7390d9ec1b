//! Driving port resolving a session's user id into a full caller identity.
//!
//! Handlers hold only the user id the session cookie stores; every request
//! resolves it afresh so role edits and deactivations take effect without
//! waiting for the cookie to expire.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::identity::CallerIdentity;
use crate::domain::user::UserId;

use super::define_port_error;
use super::directory_repository::{DirectoryRepository, DirectoryRepositoryError};

define_port_error! {
    /// Errors raised when resolving a caller identity.
    pub enum IdentityResolutionError {
        /// No user exists for the session's user id.
        UnknownUser =>
            "no user exists for the session identity",
        /// The user exists but has been deactivated.
        InactiveUser =>
            "the session user has been deactivated",
        /// The user references a role missing from the catalogue.
        MissingRole { message: String } =>
            "identity role lookup failed: {message}",
        /// The directory could not be consulted.
        Lookup { message: String } =>
            "identity lookup failed: {message}",
    }
}

/// Port turning a stored user id into a [`CallerIdentity`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the identity behind `user_id`.
    async fn resolve(&self, user_id: &UserId) -> Result<CallerIdentity, IdentityResolutionError>;
}

/// Resolver backed by the directory: joins the user with their role to
/// produce the capability set.
#[derive(Debug, Clone)]
pub struct DirectoryIdentityResolver<R> {
    directory: Arc<R>,
}

impl<R> DirectoryIdentityResolver<R>
where
    R: DirectoryRepository,
{
    /// Create a resolver over the given directory.
    pub fn new(directory: Arc<R>) -> Self {
        Self { directory }
    }
}

fn map_directory_error(error: DirectoryRepositoryError) -> IdentityResolutionError {
    IdentityResolutionError::lookup(error.to_string())
}

#[async_trait]
impl<R> IdentityResolver for DirectoryIdentityResolver<R>
where
    R: DirectoryRepository,
{
    async fn resolve(&self, user_id: &UserId) -> Result<CallerIdentity, IdentityResolutionError> {
        let user = self
            .directory
            .find_user(user_id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(IdentityResolutionError::unknown_user)?;

        if !user.is_active() {
            return Err(IdentityResolutionError::inactive_user());
        }

        let role = self
            .directory
            .find_role(user.role_id())
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| {
                IdentityResolutionError::missing_role(format!(
                    "role {} referenced by user {} does not exist",
                    user.role_id(),
                    user.id()
                ))
            })?;

        Ok(CallerIdentity::new(
            user.id().clone(),
            user.home_area_id(),
            role.capabilities(),
        ))
    }
}
