//! PostgreSQL-backed `DonorRepository` implementation using Diesel ORM.
//!
//! Email uniqueness is enforced by the `donors_email_key` index; unique
//! violations come back as `DuplicateEmail` carrying the rejected address.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use mockable::Clock;

use crate::domain::ports::{BloodGroupStat, DonorFilter, DonorRepository, DonorRepositoryError};
use crate::domain::{BloodGroup, Donor, DonorDraft, DonorId, NewDonor};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DonorRow, DonorUpdate, NewDonorRow};
use super::pool::{DbPool, PoolError};
use super::schema::donors;

/// Diesel-backed implementation of the donor repository port.
#[derive(Clone)]
pub struct DieselDonorRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselDonorRepository {
    /// Create a new repository with the given connection pool.
    ///
    /// `clock` stamps `created_at` and `updated_at`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

/// Map pool errors to domain repository errors.
fn map_pool_error(error: PoolError) -> DonorRepositoryError {
    map_basic_pool_error(error, DonorRepositoryError::connection)
}

/// Map Diesel errors to domain repository errors.
fn map_diesel_error(error: DieselError) -> DonorRepositoryError {
    map_basic_diesel_error(
        error,
        DonorRepositoryError::query,
        DonorRepositoryError::connection,
    )
}

/// Map errors from inserts and updates, where the email index may fire.
fn map_write_error(error: DieselError, email: &str) -> DonorRepositoryError {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DonorRepositoryError::duplicate_email(email)
        }
        other => map_diesel_error(other),
    }
}

/// Convert a database row into a validated domain donor.
fn row_to_donor(row: DonorRow) -> Result<Donor, DonorRepositoryError> {
    let DonorRow {
        id,
        name,
        age,
        blood_group,
        contact_number,
        email,
        address,
        last_donation_date,
        latitude,
        longitude,
        created_at,
        updated_at,
    } = row;

    let record = NewDonor::try_from(DonorDraft {
        name: Some(name),
        age: Some(age),
        blood_group: Some(blood_group),
        contact_number: Some(contact_number),
        email: Some(email),
        address: Some(address),
        last_donation_date,
        latitude,
        longitude,
    })
    .map_err(|err| DonorRepositoryError::query(format!("stored donor {id} is invalid: {err}")))?;

    Ok(Donor::new(
        DonorId::from_uuid(id),
        record,
        created_at,
        updated_at,
    ))
}

fn rows_to_donors(rows: Vec<DonorRow>) -> Result<Vec<Donor>, DonorRepositoryError> {
    rows.into_iter().map(row_to_donor).collect()
}

#[async_trait]
impl DonorRepository for DieselDonorRepository {
    async fn create(&self, donor: &NewDonor) -> Result<Donor, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let now = self.clock.utc();

        let new_row = NewDonorRow {
            id: *DonorId::random().as_uuid(),
            name: donor.name(),
            age: donor.age(),
            blood_group: donor.blood_group().as_ref(),
            contact_number: donor.contact_number(),
            email: donor.email().as_ref(),
            address: donor.address(),
            last_donation_date: donor.last_donation_date(),
            latitude: donor.latitude(),
            longitude: donor.longitude(),
            created_at: now,
            updated_at: now,
        };

        let row = diesel::insert_into(donors::table)
            .values(&new_row)
            .returning(DonorRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, donor.email().as_ref()))?;

        row_to_donor(row)
    }

    async fn find(&self, filter: &DonorFilter) -> Result<Vec<Donor>, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = donors::table.into_boxed();
        if let Some(blood_group) = &filter.blood_group {
            query = query.filter(donors::blood_group.eq(blood_group.as_ref().to_owned()));
        }
        if let Some(cutoff) = filter.eligibility_cutoff {
            query = query.filter(
                donors::last_donation_date
                    .is_null()
                    .or(donors::last_donation_date.le(cutoff)),
            );
        }

        let rows: Vec<DonorRow> = query
            .order((donors::created_at.desc(), donors::id.desc()))
            .select(DonorRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_donors(rows)
    }

    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = donors::table
            .find(*id.as_uuid())
            .select(DonorRow::as_select())
            .first::<DonorRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_donor).transpose()
    }

    async fn update(
        &self,
        id: &DonorId,
        donor: &NewDonor,
    ) -> Result<Option<Donor>, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = DonorUpdate {
            name: donor.name(),
            age: donor.age(),
            blood_group: donor.blood_group().as_ref(),
            contact_number: donor.contact_number(),
            email: donor.email().as_ref(),
            address: donor.address(),
            last_donation_date: donor.last_donation_date(),
            latitude: donor.latitude(),
            longitude: donor.longitude(),
            updated_at: self.clock.utc(),
        };

        let row = diesel::update(donors::table.find(*id.as_uuid()))
            .set(&changes)
            .returning(DonorRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, donor.email().as_ref()))?;

        row.map(row_to_donor).transpose()
    }

    async fn delete(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::delete(donors::table.find(*id.as_uuid()))
            .returning(DonorRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_donor).transpose()
    }

    async fn blood_group_stats(&self) -> Result<Vec<BloodGroupStat>, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(String, i64, Option<i64>)> = donors::table
            .group_by(donors::blood_group)
            .select((
                donors::blood_group,
                count_star(),
                diesel::dsl::sum(donors::age),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_stats(rows)
    }

    async fn count_all(&self) -> Result<u64, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = donors::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        u64::try_from(total).map_err(|_| DonorRepositoryError::query("negative donor count"))
    }
}

/// Convert grouped rows, ordered by label bytes rather than the database
/// collation so both stores agree.
fn rows_to_stats(
    rows: Vec<(String, i64, Option<i64>)>,
) -> Result<Vec<BloodGroupStat>, DonorRepositoryError> {
    let mut stats = rows
        .into_iter()
        .map(row_to_stat)
        .collect::<Result<Vec<_>, _>>()?;
    stats.sort_by(|left, right| left.blood_group.cmp(&right.blood_group));
    Ok(stats)
}

fn row_to_stat(
    (blood_group, count, age_sum): (String, i64, Option<i64>),
) -> Result<BloodGroupStat, DonorRepositoryError> {
    let blood_group = BloodGroup::new(&blood_group).map_err(|err| {
        DonorRepositoryError::query(format!("stored blood group {blood_group:?} is invalid: {err}"))
    })?;
    let count = u64::try_from(count)
        .map_err(|_| DonorRepositoryError::query("negative blood group count"))?;
    let average_age = if count == 0 {
        0.0
    } else {
        age_sum.unwrap_or(0) as f64 / count as f64
    };
    Ok(BloodGroupStat {
        blood_group,
        count,
        average_age,
    })
}

#[cfg(test)]
mod tests {
    //! Unit coverage for row and error mapping; queries need a live database.

    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn sample_row() -> DonorRow {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        DonorRow {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            age: 36,
            blood_group: "O+".to_owned(),
            contact_number: "555".to_owned(),
            email: "ada@example.com".to_owned(),
            address: "1 Analytical Row".to_owned(),
            last_donation_date: None,
            latitude: Some(51.5),
            longitude: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_email() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );

        assert_eq!(
            map_write_error(error, "ada@example.com"),
            DonorRepositoryError::duplicate_email("ada@example.com")
        );
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );

        assert!(matches!(
            map_write_error(error, "ada@example.com"),
            DonorRepositoryError::Connection { .. }
        ));
    }

    #[rstest]
    fn other_database_errors_are_generic_queries() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new("latitude out of range".to_owned()),
        );

        assert_eq!(
            map_diesel_error(error),
            DonorRepositoryError::query("database error")
        );
    }

    #[rstest]
    fn row_converts_to_domain_donor() {
        let row = sample_row();
        let id = row.id;

        let donor = row_to_donor(row).expect("valid row");

        assert_eq!(donor.id(), DonorId::from_uuid(id));
        assert_eq!(donor.record().latitude(), Some(51.5));
    }

    #[rstest]
    fn corrupt_row_is_a_query_error() {
        let row = DonorRow {
            email: "  ".to_owned(),
            ..sample_row()
        };

        assert!(matches!(
            row_to_donor(row),
            Err(DonorRepositoryError::Query { .. })
        ));
    }

    #[rstest]
    fn stat_rows_average_the_age_sum() {
        let stat = row_to_stat(("A+".to_owned(), 2, Some(70))).expect("valid stat");

        assert_eq!(stat.blood_group.as_ref(), "A+");
        assert_eq!(stat.count, 2);
        assert!((stat.average_age - 35.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn stats_are_ordered_by_label_bytes() {
        let rows = vec![
            ("AB+".to_owned(), 1, Some(40)),
            ("A-".to_owned(), 1, Some(30)),
            ("O+".to_owned(), 1, Some(50)),
            ("A+".to_owned(), 1, Some(20)),
        ];

        let stats = rows_to_stats(rows).expect("valid stats");

        let labels: Vec<&str> = stats.iter().map(|stat| stat.blood_group.as_ref()).collect();
        assert_eq!(labels, ["A+", "A-", "AB+", "O+"]);
    }
}
