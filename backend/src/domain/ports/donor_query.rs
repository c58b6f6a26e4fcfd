//! Driving port for donor read operations.
//!
//! Inbound adapters pass identifiers and filters as raw text; the service
//! parses them so malformed input maps to domain errors consistently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Donor, Error};

use super::BloodGroupStat;

/// Filter for [`DonorQuery::list_donors`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDonorsRequest {
    /// Case-insensitive exact blood group match.
    pub blood_group: Option<String>,
    /// `Some(true)` keeps eligible donors only. `Some(false)` and `None`
    /// apply no eligibility filter.
    pub is_eligible: Option<bool>,
}

/// Aggregate view across every stored donor.
#[derive(Debug, Clone, PartialEq)]
pub struct DonorStats {
    /// Per blood group counts, ordered by label ascending.
    pub groups: Vec<BloodGroupStat>,
    pub total: u64,
}

/// Driving port for donor queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonorQuery: Send + Sync {
    /// Donors matching `request`, newest created first.
    async fn list_donors(&self, request: ListDonorsRequest) -> Result<Vec<Donor>, Error>;

    /// One donor by identifier.
    ///
    /// Fails with `InvalidIdentifier` for malformed ids and `NotFound` when
    /// no donor has the id.
    async fn get_donor(&self, id: &str) -> Result<Donor, Error>;

    /// Donors with the given blood group; empty when none match.
    async fn donors_by_blood_group(&self, blood_group: &str) -> Result<Vec<Donor>, Error>;

    /// Count and average age per blood group plus the grand total.
    async fn donor_stats(&self) -> Result<DonorStats, Error>;
}
