//! Builders wiring donor services onto the configured store.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use backend::domain::ports::{DonorCommand, DonorImportCommand, DonorQuery, DonorRepository};
use backend::domain::{DonorImportService, DonorService};
use backend::inbound::http::state::HttpState;
use backend::outbound::CsvDonorSource;
use backend::outbound::memory::InMemoryDonorRepository;
use backend::outbound::persistence::DieselDonorRepository;

use super::ServerConfig;

/// Assemble the handler ports over one shared repository.
fn state_over<R>(repo: Arc<R>, clock: Arc<dyn Clock>) -> HttpState
where
    R: DonorRepository + 'static,
{
    let service = Arc::new(DonorService::new(repo.clone(), clock));
    let import: Arc<dyn DonorImportCommand> =
        Arc::new(DonorImportService::new(Arc::new(CsvDonorSource), repo));
    let query: Arc<dyn DonorQuery> = service.clone();
    let command: Arc<dyn DonorCommand> = service;
    HttpState::new(query, command, import)
}

/// Build HTTP state, backed by PostgreSQL when a pool is configured and by
/// process memory otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    build_http_state_with_clock(config, Arc::new(DefaultClock))
}

fn build_http_state_with_clock(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => {
            info!("donor store: postgres");
            state_over(
                Arc::new(DieselDonorRepository::new(pool.clone(), clock.clone())),
                clock,
            )
        }
        None => {
            info!("donor store: in-memory");
            state_over(Arc::new(InMemoryDonorRepository::new(clock.clone())), clock)
        }
    };
    web::Data::new(state.with_import_root(config.import_dir.clone()))
}

#[cfg(test)]
mod tests {
    //! Wiring tests for the in-memory fallback.

    use std::net::SocketAddr;

    use backend::domain::ports::ListDonorsRequest;
    use backend::test_support::{donor_draft, fixture_clock};

    use super::*;

    #[tokio::test]
    async fn no_pool_shares_one_in_memory_store() {
        let config = ServerConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)));
        let state = build_http_state_with_clock(&config, fixture_clock());

        state
            .donors
            .create_donor(donor_draft("shared@example.com"))
            .await
            .expect("create");
        let listed = state
            .donors_query
            .list_donors(ListDonorsRequest::default())
            .await
            .expect("list");

        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn import_dir_reaches_http_state() {
        let config = ServerConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)))
            .with_import_dir("/srv/donor-imports");

        let state = build_http_state_with_clock(&config, fixture_clock());

        assert_eq!(state.import_root, std::path::Path::new("/srv/donor-imports"));
    }
}
