//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the document store and directory ports,
//! backed by PostgreSQL via `diesel-async` with `bb8` connection pooling.
//! An in-memory pair backs the same ports for tests and database-free runs.
//!
//! # Architecture
//!
//! - **Thin adapters**: implementations only translate between Diesel rows
//!   and domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and schema definitions
//!   (`schema.rs`) never leak past this module.
//! - **Optimistic writes**: document transitions compare-and-swap on the
//!   stored version inside one transaction; a lost race maps to a conflict,
//!   never a partial write.
//! - **Strongly typed errors**: database failures are mapped onto the port
//!   error enums before they reach the domain.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselDocumentStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/tramite")).await?;
//! let store = DieselDocumentStore::new(pool);
//! ```

mod diesel_directory_repository;
mod diesel_document_store;
mod diesel_error_mapping;
mod memory;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_directory_repository::DieselDirectoryRepository;
pub use diesel_document_store::DieselDocumentStore;
pub use memory::{MemoryDirectoryRepository, MemoryDocumentStore};
pub use migrations::{MigrationError, apply_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
