//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::ports::{DonorCommand, DonorImportCommand, DonorQuery};

/// Directory HTTP imports read from unless configured otherwise.
pub const DEFAULT_IMPORT_DIR: &str = "imports";

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub donors_query: Arc<dyn DonorQuery>,
    pub donors: Arc<dyn DonorCommand>,
    pub donor_import: Arc<dyn DonorImportCommand>,
    /// Import requests name files relative to this directory.
    pub import_root: PathBuf,
}

impl HttpState {
    /// Bundle the donor driving ports.
    ///
    /// # Examples
    /// ```
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    ///
    /// use backend::domain::{DonorImportService, DonorService};
    /// use backend::inbound::http::state::HttpState;
    /// use backend::outbound::CsvDonorSource;
    /// use backend::outbound::memory::InMemoryDonorRepository;
    /// use mockable::DefaultClock;
    ///
    /// let repo = Arc::new(InMemoryDonorRepository::new(Arc::new(DefaultClock)));
    /// let service = Arc::new(DonorService::new(repo.clone(), Arc::new(DefaultClock)));
    /// let import = Arc::new(DonorImportService::new(Arc::new(CsvDonorSource), repo));
    /// let state = HttpState::new(service.clone(), service, import)
    ///     .with_import_root("/srv/donor-imports");
    /// assert!(state.import_root.ends_with("donor-imports"));
    /// ```
    pub fn new(
        donors_query: Arc<dyn DonorQuery>,
        donors: Arc<dyn DonorCommand>,
        donor_import: Arc<dyn DonorImportCommand>,
    ) -> Self {
        Self {
            donors_query,
            donors,
            donor_import,
            import_root: PathBuf::from(DEFAULT_IMPORT_DIR),
        }
    }

    /// Confine CSV imports to `root`.
    #[must_use]
    pub fn with_import_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.import_root = root.into();
        self
    }
}
