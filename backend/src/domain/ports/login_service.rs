//! Driving port for authenticating login credentials.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::auth::LoginCredentials;
use crate::domain::error::Error;
use crate::domain::user::{UserId, Username};

use super::directory_repository::DirectoryRepository;

/// Port exposing credential verification to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Authenticate the supplied credentials.
    ///
    /// Returns the authenticated [`UserId`] on success and an
    /// [`Error`] with `ErrorCode::Unauthorized` when the username is
    /// unknown, the password does not match, or the user is inactive.
    /// The three failure modes share one message so responses do not
    /// reveal which usernames exist.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}

/// Login service backed by the directory's stored password hashes.
#[derive(Debug, Clone)]
pub struct DirectoryLoginService<R> {
    directory: Arc<R>,
}

impl<R> DirectoryLoginService<R>
where
    R: DirectoryRepository,
{
    /// Create a login service over the given directory.
    pub fn new(directory: Arc<R>) -> Self {
        Self { directory }
    }
}

fn rejected() -> Error {
    Error::unauthorized("invalid credentials")
}

#[async_trait]
impl<R> LoginService for DirectoryLoginService<R>
where
    R: DirectoryRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        // A name that fails username validation cannot belong to any
        // stored account.
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(rejected());
        };
        let lookup = self
            .directory
            .find_user_by_username(&username)
            .await
            .map_err(|error| {
                warn!(error = %error, "credential lookup failed");
                Error::service_unavailable("login is temporarily unavailable")
            })?;

        let Some((user, hash)) = lookup else {
            return Err(rejected());
        };
        if !user.is_active() || !hash.verify(credentials.password()) {
            return Err(rejected());
        }

        Ok(user.id().clone())
    }
}
