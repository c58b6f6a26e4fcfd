//! Bulk-import donors from a CSV file straight into PostgreSQL.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use backend::TraceId;
use backend::domain::DonorImportService;
use backend::domain::ports::{DonorImportCommand, DonorImportRequest};
use backend::outbound::CsvDonorSource;
use backend::outbound::persistence::{
    DbPool, DieselDonorRepository, PoolConfig, run_pending_migrations,
};
use clap::Parser;
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `import-donors` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "import-donors",
    about = "Import donor records from a CSV file and print the import report",
    version
)]
struct CliArgs {
    /// CSV file with a header row.
    #[arg(long = "file", value_name = "path")]
    file: PathBuf,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Skip applying embedded migrations before importing.
    #[arg(long = "skip-migrations")]
    skip_migrations: bool,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("tracing init failed: {e}");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(TraceId::scope(TraceId::generate(), async_main()))
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url)?;

    if args.skip_migrations {
        warn!("skipping migrations");
    } else {
        run_pending_migrations(&database_url)
            .await
            .map_err(io::Error::other)?;
    }

    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let repo = Arc::new(DieselDonorRepository::new(pool, Arc::new(DefaultClock)));
    let command = DonorImportService::new(Arc::new(CsvDonorSource), repo);

    let report = command
        .import_csv(DonorImportRequest { path: args.file })
        .await
        .map_err(|error| {
            let details = error
                .details()
                .map(|details| format!("\n{details:#}"))
                .unwrap_or_default();
            io::Error::other(format!("import failed: {error}{details}"))
        })?;

    info!(
        trace_id = ?TraceId::current().map(|id| id.to_string()),
        "import complete"
    );
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| io::Error::other(format!("render import report: {error}")))?;
    println!("{rendered}");

    Ok(())
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    resolve_database_url_from(explicit, env::var("DATABASE_URL").ok())
}

fn resolve_database_url_from(
    explicit: Option<String>,
    from_env: Option<String>,
) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    let from_env = from_env.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DATABASE_URL",
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        ));
    }
    Ok(from_env)
}
