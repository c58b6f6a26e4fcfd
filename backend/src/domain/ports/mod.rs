//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`DonorRepository`], [`DonorSource`]) are implemented by
//! outbound adapters. Driving ports ([`DonorQuery`], [`DonorCommand`],
//! [`DonorImportCommand`]) are implemented by domain services and called by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod donor_command;
mod donor_import_command;
mod donor_query;
mod donor_repository;
mod donor_source;

#[cfg(test)]
pub use donor_command::MockDonorCommand;
pub use donor_command::DonorCommand;
pub use donor_import_command::{
    DonorImportCommand, DonorImportReport, DonorImportRequest, ImportIssue,
};
#[cfg(test)]
pub use donor_query::MockDonorQuery;
pub use donor_query::{DonorQuery, DonorStats, ListDonorsRequest};
#[cfg(test)]
pub use donor_repository::MockDonorRepository;
pub use donor_repository::{BloodGroupStat, DonorFilter, DonorRepository, DonorRepositoryError};
#[cfg(test)]
pub use donor_source::MockDonorSource;
pub use donor_source::{DonorRowStream, DonorSource, DonorSourceError, RawDonorRow};
