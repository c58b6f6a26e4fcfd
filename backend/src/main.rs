//! Backend entry-point: loads settings, prepares the donor store and serves
//! the REST API with OpenAPI docs.

mod server;

use actix_web::web;
use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, run_pending_migrations};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let mut config =
        ServerConfig::new(settings.bind_addr()).with_import_dir(settings.import_dir());

    if let Some(pool_config) = settings.pool_config() {
        if settings.run_migrations {
            run_pending_migrations(pool_config.database_url())
                .await
                .map_err(std::io::Error::other)?;
        }
        let pool = DbPool::new(pool_config)
            .await
            .map_err(|e| std::io::Error::other(format!("failed to build database pool: {e}")))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("no database configured; donors are kept in memory");
    }

    info!(
        bind_addr = %config.bind_addr(),
        import_dir = %settings.import_dir().display(),
        "starting donor registry"
    );
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
