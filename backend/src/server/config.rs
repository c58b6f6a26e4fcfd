//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;

use backend::inbound::http::state::DEFAULT_IMPORT_DIR;
use backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) import_dir: PathBuf,
}

impl ServerConfig {
    /// Construct a server configuration listening on `bind_addr`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            import_dir: PathBuf::from(DEFAULT_IMPORT_DIR),
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, donors are stored in PostgreSQL; otherwise the server
    /// keeps them in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Directory HTTP imports are confined to.
    #[must_use]
    pub fn with_import_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_dir = dir.into();
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
