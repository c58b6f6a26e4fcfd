//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::donors;

/// Row struct for reading from the donors table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = donors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DonorRow {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub blood_group: String,
    pub contact_number: String,
    pub email: String,
    pub address: String,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new donor records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = donors)]
pub(crate) struct NewDonorRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub age: i32,
    pub blood_group: &'a str,
    pub contact_number: &'a str,
    pub email: &'a str,
    pub address: &'a str,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct replacing every mutable donor column.
///
/// `None` writes `NULL` so cleared optional fields are persisted.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = donors)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DonorUpdate<'a> {
    pub name: &'a str,
    pub age: i32,
    pub blood_group: &'a str,
    pub contact_number: &'a str,
    pub email: &'a str,
    pub address: &'a str,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: DateTime<Utc>,
}
