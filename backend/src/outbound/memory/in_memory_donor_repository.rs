//! In-memory implementation of [`DonorRepository`].
//!
//! Records live in insertion order behind one `RwLock`. The email index is
//! checked and updated under the same write guard as the record list, so two
//! concurrent creates with one email cannot both succeed.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{BloodGroupStat, DonorFilter, DonorRepository, DonorRepositoryError};
use crate::domain::{BloodGroup, Donor, DonorId, EmailAddress, NewDonor};

#[derive(Default)]
struct Store {
    donors: Vec<Donor>,
    emails: HashMap<EmailAddress, DonorId>,
}

impl Store {
    fn position(&self, id: &DonorId) -> Option<usize> {
        self.donors.iter().position(|donor| donor.id() == *id)
    }

    fn claim_email(&mut self, email: &EmailAddress, id: DonorId) -> Result<(), DonorRepositoryError> {
        match self.emails.get(email) {
            Some(owner) if *owner != id => Err(DonorRepositoryError::duplicate_email(
                email.as_ref(),
            )),
            _ => {
                self.emails.insert(email.clone(), id);
                Ok(())
            }
        }
    }
}

/// Donor store held in process memory.
pub struct InMemoryDonorRepository {
    store: RwLock<Store>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDonorRepository {
    /// Create an empty store stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, DonorRepositoryError> {
        self.store
            .read()
            .map_err(|_| DonorRepositoryError::query("donor store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, DonorRepositoryError> {
        self.store
            .write()
            .map_err(|_| DonorRepositoryError::query("donor store lock poisoned"))
    }
}

#[async_trait]
impl DonorRepository for InMemoryDonorRepository {
    async fn create(&self, donor: &NewDonor) -> Result<Donor, DonorRepositoryError> {
        let mut store = self.write()?;
        let id = DonorId::random();
        store.claim_email(donor.email(), id)?;

        let now = self.clock.utc();
        let created = Donor::new(id, donor.clone(), now, now);
        store.donors.push(created.clone());
        Ok(created)
    }

    async fn find(&self, filter: &DonorFilter) -> Result<Vec<Donor>, DonorRepositoryError> {
        let store = self.read()?;
        let mut matches: Vec<Donor> = store
            .donors
            .iter()
            .rev()
            .filter(|donor| filter.matches(donor))
            .cloned()
            .collect();
        // Stable sort keeps later inserts first among equal timestamps.
        matches.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matches)
    }

    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError> {
        let store = self.read()?;
        Ok(store.donors.iter().find(|donor| donor.id() == *id).cloned())
    }

    async fn update(
        &self,
        id: &DonorId,
        donor: &NewDonor,
    ) -> Result<Option<Donor>, DonorRepositoryError> {
        let mut store = self.write()?;
        let Some(index) = store.position(id) else {
            return Ok(None);
        };
        store.claim_email(donor.email(), *id)?;

        let previous = store.donors[index].clone();
        let previous_email = previous.record().email();
        if previous_email != donor.email() {
            store.emails.remove(previous_email);
        }

        let updated = Donor::new(*id, donor.clone(), previous.created_at(), self.clock.utc());
        store.donors[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError> {
        let mut store = self.write()?;
        let Some(index) = store.position(id) else {
            return Ok(None);
        };
        let removed = store.donors.remove(index);
        store.emails.remove(removed.record().email());
        Ok(Some(removed))
    }

    async fn blood_group_stats(&self) -> Result<Vec<BloodGroupStat>, DonorRepositoryError> {
        let store = self.read()?;
        let mut groups: BTreeMap<&BloodGroup, (u64, i64)> = BTreeMap::new();
        for donor in &store.donors {
            let entry = groups.entry(donor.record().blood_group()).or_default();
            entry.0 += 1;
            entry.1 += i64::from(donor.record().age());
        }

        Ok(groups
            .into_iter()
            .map(|(blood_group, (count, age_sum))| BloodGroupStat {
                blood_group: blood_group.clone(),
                count,
                average_age: age_sum as f64 / count as f64,
            })
            .collect())
    }

    async fn count_all(&self) -> Result<u64, DonorRepositoryError> {
        let store = self.read()?;
        Ok(store.donors.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::DonorDraft;
    use crate::test_support::{donor_draft, fixture_clock};

    #[fixture]
    fn repo() -> InMemoryDonorRepository {
        InMemoryDonorRepository::new(fixture_clock())
    }

    fn record(email: &str, blood_group: &str, age: i32) -> NewDonor {
        NewDonor::try_from(DonorDraft {
            blood_group: Some(blood_group.to_owned()),
            age: Some(age),
            ..donor_draft(email)
        })
        .expect("valid donor")
    }

    #[rstest]
    #[tokio::test]
    async fn create_assigns_id_and_timestamps(repo: InMemoryDonorRepository) {
        let created = repo
            .create(&record("a@example.com", "A+", 30))
            .await
            .expect("create");

        assert_eq!(created.created_at(), created.updated_at());
        let fetched = repo.find_by_id(&created.id()).await.expect("find");
        assert_eq!(fetched, Some(created));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected(repo: InMemoryDonorRepository) {
        repo.create(&record("dup@example.com", "A+", 30))
            .await
            .expect("first create");

        let second = repo.create(&record("DUP@example.com", "B+", 40)).await;

        assert_eq!(
            second,
            Err(DonorRepositoryError::duplicate_email("dup@example.com"))
        );
        assert_eq!(repo.count_all().await.expect("count"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn find_returns_newest_first(repo: InMemoryDonorRepository) {
        for email in ["1@example.com", "2@example.com", "3@example.com"] {
            repo.create(&record(email, "O+", 30)).await.expect("create");
        }

        let donors = repo.find(&DonorFilter::default()).await.expect("find");
        let emails: Vec<&str> = donors
            .iter()
            .map(|donor| donor.record().email().as_ref())
            .collect();

        assert_eq!(emails, ["3@example.com", "2@example.com", "1@example.com"]);
    }

    #[rstest]
    #[tokio::test]
    async fn update_moves_email_index(repo: InMemoryDonorRepository) {
        let first = repo
            .create(&record("old@example.com", "A+", 30))
            .await
            .expect("create");
        let other = repo
            .create(&record("other@example.com", "A+", 30))
            .await
            .expect("create");

        let taken = repo
            .update(&first.id(), &record("other@example.com", "A+", 30))
            .await;
        assert!(matches!(taken, Err(DonorRepositoryError::DuplicateEmail { .. })));

        repo.update(&first.id(), &record("new@example.com", "A+", 31))
            .await
            .expect("update")
            .expect("donor exists");
        repo.create(&record("old@example.com", "B+", 22))
            .await
            .expect("old email is free again");
        assert!(repo.find_by_id(&other.id()).await.expect("find").is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn update_and_delete_missing_return_none(repo: InMemoryDonorRepository) {
        let id = DonorId::random();

        assert_eq!(
            repo.update(&id, &record("x@example.com", "A+", 1))
                .await
                .expect("update"),
            None
        );
        assert_eq!(repo.delete(&id).await.expect("delete"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_frees_email(repo: InMemoryDonorRepository) {
        let donor = repo
            .create(&record("gone@example.com", "A+", 30))
            .await
            .expect("create");

        let removed = repo.delete(&donor.id()).await.expect("delete");

        assert_eq!(removed.map(|d| d.id()), Some(donor.id()));
        repo.create(&record("gone@example.com", "A+", 30))
            .await
            .expect("email reusable");
    }

    #[rstest]
    #[tokio::test]
    async fn stats_group_by_label_ascending(repo: InMemoryDonorRepository) {
        repo.create(&record("a@example.com", "B-", 50)).await.expect("create");
        repo.create(&record("b@example.com", "A+", 30)).await.expect("create");
        repo.create(&record("c@example.com", "a+", 40)).await.expect("create");

        let stats = repo.blood_group_stats().await.expect("stats");

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].blood_group.as_ref(), "A+");
        assert_eq!(stats[0].count, 2);
        assert!((stats[0].average_age - 35.0).abs() < f64::EPSILON);
        assert_eq!(stats[1].blood_group.as_ref(), "B-");
        assert_eq!(stats[1].count, 1);
        assert!((stats[1].average_age - 50.0).abs() < f64::EPSILON);
    }
}
