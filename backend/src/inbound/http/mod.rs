//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers parse and validate payloads at the edge, resolve the caller's
//! identity from the session, and call domain services through the shared
//! [`state::HttpState`]. Everything framework-specific stays in this module.

pub mod derivations;
pub mod directory;
pub mod documents;
pub mod error;
pub mod health;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
