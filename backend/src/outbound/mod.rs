//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic:
//! every rule about who may move a document, and when, lives in the domain
//! layer.
//!
//! - **persistence**: PostgreSQL-backed stores using Diesel, plus in-memory
//!   equivalents for tests and local runs without a database.

pub mod persistence;
