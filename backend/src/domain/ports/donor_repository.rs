//! Driven port for donor persistence.
//!
//! Adapters own connection management and the email uniqueness constraint.
//! A unique-key violation must come back as
//! [`DonorRepositoryError::DuplicateEmail`], never as a generic query error,
//! so callers can classify it without knowing the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BloodGroup, Donor, DonorId, NewDonor};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by donor repository adapters.
    pub enum DonorRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "donor repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "donor repository query failed: {message}",
        /// Another record already holds this email.
        DuplicateEmail { email: String } => "donor email already exists: {email}",
    }
}

/// Predicate applied by [`DonorRepository::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorFilter {
    /// Exact match on the normalised blood group.
    pub blood_group: Option<BloodGroup>,
    /// Keep donors who never donated or last donated at or before this instant.
    pub eligibility_cutoff: Option<DateTime<Utc>>,
}

impl DonorFilter {
    /// Whether `donor` satisfies every populated predicate.
    pub fn matches(&self, donor: &Donor) -> bool {
        let record = donor.record();
        let group_ok = self
            .blood_group
            .as_ref()
            .is_none_or(|group| record.blood_group() == group);
        let eligible_ok = self
            .eligibility_cutoff
            .is_none_or(|cutoff| crate::domain::is_eligible(record.last_donation_date(), cutoff));
        group_ok && eligible_ok
    }
}

/// Per blood group aggregate returned by [`DonorRepository::blood_group_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct BloodGroupStat {
    pub blood_group: BloodGroup,
    pub count: u64,
    pub average_age: f64,
}

/// Port over the donor record store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonorRepository: Send + Sync {
    /// Insert a new donor and return it with its assigned id and timestamps.
    async fn create(&self, donor: &NewDonor) -> Result<Donor, DonorRepositoryError>;

    /// Return donors matching `filter`, newest created first.
    async fn find(&self, filter: &DonorFilter) -> Result<Vec<Donor>, DonorRepositoryError>;

    /// Fetch a donor by identifier.
    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError>;

    /// Replace the stored fields of an existing donor.
    ///
    /// Returns `Ok(None)` when no donor has this id.
    async fn update(
        &self,
        id: &DonorId,
        donor: &NewDonor,
    ) -> Result<Option<Donor>, DonorRepositoryError>;

    /// Remove a donor, returning the deleted record when it existed.
    async fn delete(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError>;

    /// Count and average age per blood group, ordered by label ascending.
    async fn blood_group_stats(&self) -> Result<Vec<BloodGroupStat>, DonorRepositoryError>;

    /// Total number of stored donors.
    async fn count_all(&self) -> Result<u64, DonorRepositoryError>;
}
