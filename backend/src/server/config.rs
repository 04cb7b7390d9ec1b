//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use mockable::Env;

use crate::inbound::http::session_config::SessionSettings;
use crate::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Default socket address when `BIND_ADDR` is unset.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from a validated session policy and
    /// a bind address.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server uses the Diesel-backed document store and
    /// directory; otherwise it falls back to the in-memory pair.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

/// Resolve the bind address from `BIND_ADDR`, defaulting to `0.0.0.0:8080`.
///
/// # Errors
/// Returns an error when the variable is set but does not parse as a socket
/// address.
pub fn bind_addr_from_env<E: Env>(env: &E) -> std::io::Result<SocketAddr> {
    let raw = env
        .string("BIND_ADDR")
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    raw.parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR '{raw}': {e}")))
}

/// Read the optional database URL from `DATABASE_URL`.
///
/// Absence is not an error: the server runs over in-memory adapters when no
/// database is configured.
pub fn database_url_from_env<E: Env>(env: &E) -> Option<String> {
    env.string("DATABASE_URL").filter(|url| !url.is_empty())
}
