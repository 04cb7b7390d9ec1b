//! Embedded schema migrations applied at startup.
//!
//! The SQL under `migrations/` is compiled into the binary, so a deployed
//! server brings its own schema up to date before the connection pool is
//! built. Already-recorded versions are skipped.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure while bringing the schema up to date.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("could not connect to the database for migrations")]
    Connect(#[from] diesel::ConnectionError),
    #[error("could not apply pending migrations: {0}")]
    Apply(Box<dyn std::error::Error + Send + Sync>),
}

/// Apply any migrations not yet recorded in the target database.
///
/// Runs over a dedicated synchronous connection; call it before building
/// the async pool. Returns the number of migrations applied.
///
/// # Errors
/// Returns [`MigrationError`] when the connection cannot be established or
/// a migration fails part-way.
pub fn apply_pending_migrations(database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = PgConnection::establish(database_url)?;
    let versions = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(MigrationError::Apply)?;
    for version in &versions {
        info!(%version, "applied migration");
    }
    Ok(versions.len())
}
