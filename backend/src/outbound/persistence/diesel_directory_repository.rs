//! PostgreSQL-backed `DirectoryRepository` implementation using Diesel ORM.
//!
//! This adapter reads the role and area catalogues and provisions user
//! accounts. Stored credentials live in a column on the users table; the
//! profile changeset omits that column, and duplicate usernames surface as
//! conflicts through the unique constraint.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DirectoryRepository, DirectoryRepositoryError};
use crate::domain::{
    Area, AreaCode, AreaId, AreaName, CapabilitySet, FullName, Grade, PasswordHash, Role, RoleId,
    RoleName, User, UserDraft, UserId, Username,
};

use super::diesel_error_mapping;
use super::models::{AreaRow, NewUserRow, RoleRow, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{areas, roles, users};

/// Diesel-backed implementation of the directory repository port.
#[derive(Clone)]
pub struct DieselDirectoryRepository {
    pool: DbPool,
}

impl DieselDirectoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain repository errors.
fn map_pool_error(error: PoolError) -> DirectoryRepositoryError {
    diesel_error_mapping::map_pool_error(error, DirectoryRepositoryError::connection)
}

/// Map Diesel errors to domain repository errors.
fn map_diesel_error(error: diesel::result::Error) -> DirectoryRepositoryError {
    diesel_error_mapping::map_diesel_error(
        error,
        DirectoryRepositoryError::conflict,
        DirectoryRepositoryError::query,
        DirectoryRepositoryError::connection,
    )
}

/// Convert a database row into a validated domain user.
fn row_to_user(row: UserRow) -> Result<User, DirectoryRepositoryError> {
    let UserRow {
        id,
        username,
        full_name,
        grade,
        role_id,
        home_area_id,
        password_hash: _,
        active,
        created_at,
        updated_at,
    } = row;

    let username =
        Username::new(username).map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;
    let full_name =
        FullName::new(full_name).map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;
    let grade = grade
        .map(Grade::new)
        .transpose()
        .map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;

    Ok(User::new(UserDraft {
        id: UserId::from_uuid(id),
        username,
        full_name,
        grade,
        role_id: RoleId::from_uuid(role_id),
        home_area_id: AreaId::from_uuid(home_area_id),
        active,
        created_at,
        updated_at,
    }))
}

/// Convert a database row into a user paired with their stored password.
fn row_to_credentials(row: UserRow) -> Result<(User, PasswordHash), DirectoryRepositoryError> {
    let hash = PasswordHash::from_encoded(row.password_hash.as_str())
        .map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;
    let user = row_to_user(row)?;
    Ok((user, hash))
}

/// Convert a database row into a domain role.
fn row_to_role(row: RoleRow) -> Result<Role, DirectoryRepositoryError> {
    let RoleRow {
        id,
        name,
        access_level,
        capabilities,
    } = row;

    let name =
        RoleName::new(name).map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;

    Ok(Role::new(
        RoleId::from_uuid(id),
        name,
        access_level,
        CapabilitySet::from_bits(capabilities),
    ))
}

/// Convert a database row into a validated domain area.
fn row_to_area(row: AreaRow) -> Result<Area, DirectoryRepositoryError> {
    let AreaRow {
        id,
        name,
        code,
        active,
        created_at,
    } = row;

    let name =
        AreaName::new(name).map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;
    let code =
        AreaCode::new(code).map_err(|err| DirectoryRepositoryError::query(err.to_string()))?;

    Ok(Area::new(
        AreaId::from_uuid(id),
        name,
        code,
        active,
        created_at,
    ))
}

#[async_trait]
impl DirectoryRepository for DieselDirectoryRepository {
    async fn create_user(
        &self,
        user: &User,
        password: &PasswordHash,
    ) -> Result<(), DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            full_name: user.full_name().as_ref(),
            grade: user.grade().map(|grade| grade.as_ref()),
            role_id: *user.role_id().as_uuid(),
            home_area_id: *user.home_area_id().as_uuid(),
            password_hash: password.as_encoded(),
            active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        };

        diesel::insert_into(users::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_user(&self, user: &User) -> Result<(), DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let update = UserProfileUpdate {
            full_name: user.full_name().as_ref(),
            grade: user.grade().map(|grade| grade.as_ref()),
            role_id: *user.role_id().as_uuid(),
            home_area_id: *user.home_area_id().as_uuid(),
            active: user.is_active(),
            updated_at: user.updated_at(),
        };

        let updated = diesel::update(users::table.filter(users::id.eq(user.id().as_uuid())))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(DirectoryRepositoryError::missing(format!(
                "user {} has no directory row",
                user.id()
            )));
        }

        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_credentials).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn find_role(&self, id: RoleId) -> Result<Option<Role>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = roles::table
            .filter(roles::id.eq(id.as_uuid()))
            .select(RoleRow::as_select())
            .first::<RoleRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_role).transpose()
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<RoleRow> = roles::table
            .order((roles::access_level.asc(), roles::name.asc()))
            .select(RoleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_role).collect()
    }

    async fn find_area(&self, id: AreaId) -> Result<Option<Area>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = areas::table
            .filter(areas::id.eq(id.as_uuid()))
            .select(AreaRow::as_select())
            .first::<AreaRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_area).transpose()
    }

    async fn list_areas(&self) -> Result<Vec<Area>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<AreaRow> = areas::table
            .order(areas::code.asc())
            .select(AreaRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_area).collect()
    }
}
