//! Port for the user, role, and area directory.
//!
//! The directory is the system of record for who exists, which role they
//! hold, and which areas are live. Role and area catalogues are mutated
//! through migrations or seeding, not through this port; user accounts are
//! provisioned and updated through it.

use async_trait::async_trait;

use crate::domain::area::{Area, AreaId};
use crate::domain::auth::PasswordHash;
use crate::domain::role::{Role, RoleId};
use crate::domain::user::{User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Errors raised by directory repository adapters.
    pub enum DirectoryRepositoryError {
        /// A uniqueness rule was violated (duplicate username or id).
        Conflict { message: String } =>
            "directory conflict: {message}",
        /// The referenced record vanished between load and write.
        Missing { message: String } =>
            "directory record missing: {message}",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "directory connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "directory query failed: {message}",
    }
}

/// Port for directory reads and user-account writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Insert a new user with the given stored password.
    ///
    /// Fails with `Conflict` when the username or id is already taken.
    async fn create_user(
        &self,
        user: &User,
        password: &PasswordHash,
    ) -> Result<(), DirectoryRepositoryError>;

    /// Replace a user's stored profile.
    ///
    /// Fails with `Missing` when no row matches the user's id.
    async fn update_user(&self, user: &User) -> Result<(), DirectoryRepositoryError>;

    /// Find a user by id.
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, DirectoryRepositoryError>;

    /// Find a user and their stored password by username.
    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>, DirectoryRepositoryError>;

    /// All users, username order.
    async fn list_users(&self) -> Result<Vec<User>, DirectoryRepositoryError>;

    /// Find a role by id.
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>, DirectoryRepositoryError>;

    /// All roles, access-level order.
    async fn list_roles(&self) -> Result<Vec<Role>, DirectoryRepositoryError>;

    /// Find an area by id.
    async fn find_area(&self, id: AreaId) -> Result<Option<Area>, DirectoryRepositoryError>;

    /// All areas, code order.
    async fn list_areas(&self) -> Result<Vec<Area>, DirectoryRepositoryError>;
}
