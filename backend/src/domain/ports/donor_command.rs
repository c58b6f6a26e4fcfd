//! Driving port for donor mutations.

use async_trait::async_trait;

use crate::domain::{Donor, DonorDraft, DonorPatch, Error};

/// Driving port for single-record donor writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonorCommand: Send + Sync {
    /// Validate and persist a new donor.
    ///
    /// Fails with `InvalidRequest` when the draft breaks a field rule and
    /// `DuplicateEmail` when the email is taken.
    async fn create_donor(&self, draft: DonorDraft) -> Result<Donor, Error>;

    /// Apply `patch` to an existing donor and return the updated record.
    async fn update_donor(&self, id: &str, patch: DonorPatch) -> Result<Donor, Error>;

    /// Remove a donor and return the deleted record.
    async fn delete_donor(&self, id: &str) -> Result<Donor, Error>;
}
