//! Backend entry-point: wires REST endpoints and OpenAPI docs.

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::inbound::http::session_config::fingerprint::key_fingerprint;
use backend::inbound::http::session_config::{BuildMode, SessionSettings};
use backend::outbound::persistence::{DbPool, PoolConfig, apply_pending_migrations};
use backend::server::{ServerConfig, bind_addr_from_env, create_server, database_url_from_env};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let env = DefaultEnv::new();
    let settings = SessionSettings::from_env(&env, BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        key_fingerprint = %key_fingerprint(&settings.key),
        "session key loaded"
    );

    let bind_addr = bind_addr_from_env(&env)?;
    let mut config = ServerConfig::new(settings, bind_addr);

    if let Some(database_url) = database_url_from_env(&env) {
        let applied = apply_pending_migrations(&database_url)
            .map_err(|e| std::io::Error::other(format!("database migration failed: {e}")))?;
        info!(applied, "database schema is up to date");
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .map_err(|e| std::io::Error::other(format!("database pool setup failed: {e}")))?;
        config = config.with_db_pool(pool);
        info!("using the PostgreSQL document store");
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(make_metrics()?));
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    let server = create_server(health_state, config).await?;
    server.await
}

#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<actix_web_prom::PrometheusMetrics> {
    actix_web_prom::PrometheusMetricsBuilder::new("tramite")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(format!("configure Prometheus metrics: {e}")))
}
