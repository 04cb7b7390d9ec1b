//! Backend library modules.
//!
//! The crate follows a hexagonal layout: the [`domain`] holds entities,
//! ports, and services; [`inbound`] adapts HTTP requests onto the domain;
//! [`outbound`] implements the persistence ports; [`server`] wires the
//! layers into a running Actix application.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request-tracing middleware re-exported for application wiring.
pub use middleware::Trace;
/// Trace identifier re-exported for handlers and domain error payloads.
pub use domain::TraceId;
