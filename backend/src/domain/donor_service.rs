//! Donor query and command services.
//!
//! These services implement the donor driving ports on top of a
//! [`DonorRepository`]. Identifier and blood group text is parsed here so
//! repositories only ever see well-formed keys.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    DonorCommand, DonorFilter, DonorQuery, DonorRepository, DonorRepositoryError, DonorStats,
    ListDonorsRequest,
};
use crate::domain::{
    BloodGroup, Donor, DonorDraft, DonorId, DonorPatch, Error, NewDonor, eligibility_cutoff,
};

/// Map a store failure to the domain error surfaced to callers.
pub(crate) fn map_repository_error(error: DonorRepositoryError) -> Error {
    match error {
        DonorRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("donor repository unavailable: {message}"))
        }
        DonorRepositoryError::Query { message } => {
            Error::internal(format!("donor repository error: {message}"))
        }
        DonorRepositoryError::DuplicateEmail { email } => {
            Error::duplicate_email(format!("a donor with email {email} already exists"))
        }
    }
}

fn parse_id(raw: &str) -> Result<DonorId, Error> {
    DonorId::new(raw).map_err(|_| Error::invalid_identifier(format!("invalid donor id: {raw:?}")))
}

fn parse_blood_group(raw: &str) -> Result<BloodGroup, Error> {
    BloodGroup::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

fn not_found(id: DonorId) -> Error {
    Error::not_found(format!("donor {id} not found"))
}

/// Donor service implementing the query and command driving ports.
#[derive(Clone)]
pub struct DonorService<R> {
    donor_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> DonorService<R> {
    /// Create a service over `donor_repo`; `clock` drives eligibility.
    pub fn new(donor_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { donor_repo, clock }
    }
}

impl<R> DonorService<R>
where
    R: DonorRepository,
{
    async fn existing(&self, id: DonorId) -> Result<Donor, Error> {
        self.donor_repo
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl<R> DonorQuery for DonorService<R>
where
    R: DonorRepository,
{
    async fn list_donors(&self, request: ListDonorsRequest) -> Result<Vec<Donor>, Error> {
        let blood_group = request
            .blood_group
            .as_deref()
            .map(parse_blood_group)
            .transpose()?;
        let eligibility_cutoff =
            (request.is_eligible == Some(true)).then(|| eligibility_cutoff(self.clock.utc()));
        let filter = DonorFilter {
            blood_group,
            eligibility_cutoff,
        };
        debug!(?filter, "listing donors");

        self.donor_repo
            .find(&filter)
            .await
            .map_err(map_repository_error)
    }

    async fn get_donor(&self, id: &str) -> Result<Donor, Error> {
        self.existing(parse_id(id)?).await
    }

    async fn donors_by_blood_group(&self, blood_group: &str) -> Result<Vec<Donor>, Error> {
        let filter = DonorFilter {
            blood_group: Some(parse_blood_group(blood_group)?),
            ..DonorFilter::default()
        };
        self.donor_repo
            .find(&filter)
            .await
            .map_err(map_repository_error)
    }

    async fn donor_stats(&self) -> Result<DonorStats, Error> {
        let groups = self
            .donor_repo
            .blood_group_stats()
            .await
            .map_err(map_repository_error)?;
        let total = self
            .donor_repo
            .count_all()
            .await
            .map_err(map_repository_error)?;
        Ok(DonorStats { groups, total })
    }
}

#[async_trait]
impl<R> DonorCommand for DonorService<R>
where
    R: DonorRepository,
{
    async fn create_donor(&self, draft: DonorDraft) -> Result<Donor, Error> {
        let record = NewDonor::try_from(draft)
            .map_err(|err| Error::invalid_request(format!("invalid donor: {err}")))?;
        self.donor_repo
            .create(&record)
            .await
            .map_err(map_repository_error)
    }

    async fn update_donor(&self, id: &str, patch: DonorPatch) -> Result<Donor, Error> {
        let id = parse_id(id)?;
        let current = self.existing(id).await?;
        let record = current
            .apply_patch(patch)
            .map_err(|err| Error::invalid_request(format!("invalid donor: {err}")))?;

        self.donor_repo
            .update(&id, &record)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }

    async fn delete_donor(&self, id: &str) -> Result<Donor, Error> {
        let id = parse_id(id)?;
        self.donor_repo
            .delete(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }
}

#[cfg(test)]
#[path = "donor_service_tests.rs"]
mod tests;
