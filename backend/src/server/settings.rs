//! Application settings loaded via OrthoConfig.
//!
//! Values come from `DONOR_REGISTRY_*` environment variables, an optional
//! configuration file, and command-line flags, in OrthoConfig's usual
//! precedence.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use backend::inbound::http::state::DEFAULT_IMPORT_DIR;
use backend::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);

/// Server settings.
///
/// Without a database URL the server keeps donors in memory, which suits
/// local development and demos but loses every record on restart.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DONOR_REGISTRY")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub max_connections: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout_secs: Option<u64>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Directory that `POST /api/donors/import` reads CSV files from.
    pub import_dir: Option<PathBuf>,
}

impl AppSettings {
    /// Return the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Return the import directory, falling back to `./imports`.
    pub fn import_dir(&self) -> PathBuf {
        self.import_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMPORT_DIR))
    }

    /// Pool configuration, present only when a database URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let mut config = PoolConfig::new(url);
        if let Some(max) = self.max_connections {
            config = config.with_max_size(max);
        }
        if let Some(secs) = self.connection_timeout_secs {
            config = config.with_connection_timeout(Duration::from_secs(secs));
        }
        Some(config)
    }
}
