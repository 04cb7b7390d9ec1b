//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and services and remain testable without I/O. The
//! services are erased over `dyn` ports, letting the server wire in Diesel or
//! in-memory adapters without changing the handler signatures.

use std::sync::Arc;

use crate::domain::ports::{DirectoryRepository, DocumentStore, IdentityResolver, LoginService};
use crate::domain::{DerivationWorkflow, DirectoryService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub identity: Arc<dyn IdentityResolver>,
    pub workflow: DerivationWorkflow<dyn DocumentStore, dyn DirectoryRepository>,
    pub directory: DirectoryService<dyn DirectoryRepository>,
}

impl HttpState {
    /// Construct state from the login port, identity resolver, and domain
    /// services.
    pub fn new(
        login: Arc<dyn LoginService>,
        identity: Arc<dyn IdentityResolver>,
        workflow: DerivationWorkflow<dyn DocumentStore, dyn DirectoryRepository>,
        directory: DirectoryService<dyn DirectoryRepository>,
    ) -> Self {
        Self {
            login,
            identity,
            workflow,
            directory,
        }
    }
}
