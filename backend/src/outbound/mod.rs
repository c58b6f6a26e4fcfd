//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL donor repository using Diesel ORM
//! - **memory**: process-local donor repository for database-less runs
//! - **csv_source**: streaming CSV reader for bulk imports
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod csv_source;
pub mod memory;
pub mod persistence;

pub use csv_source::CsvDonorSource;
