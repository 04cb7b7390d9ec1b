//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod directory_repository;
mod document_store;
mod identity_resolver;
mod login_service;
mod notifier;

#[cfg(test)]
pub use directory_repository::MockDirectoryRepository;
pub use directory_repository::{DirectoryRepository, DirectoryRepositoryError};
#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{DocumentCreation, DocumentStore, DocumentStoreError, TransitionCommit};
#[cfg(test)]
pub use identity_resolver::MockIdentityResolver;
pub use identity_resolver::{DirectoryIdentityResolver, IdentityResolutionError, IdentityResolver};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{DirectoryLoginService, LoginService};
#[cfg(test)]
pub use notifier::MockDerivationNotifier;
pub use notifier::{
    DerivationEvent, DerivationEventKind, DerivationNotifier, LoggingDerivationNotifier,
    NotifierError,
};
