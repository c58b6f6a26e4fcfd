//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides the concrete donor repository backed by PostgreSQL
//! via the Diesel ORM with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: the repository only translates between Diesel
//!   models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are never exposed to the domain layer.
//! - **Strongly typed errors**: database errors are mapped to
//!   `DonorRepositoryError`; a unique violation on the email index becomes
//!   `DuplicateEmail`.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselDonorRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/donors");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselDonorRepository::new(pool, Arc::new(mockable::DefaultClock));
//! ```

mod diesel_basic_error_mapping;
mod diesel_donor_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_donor_repository::DieselDonorRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
