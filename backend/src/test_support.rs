//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests
//! or when the `test-support` feature is enabled.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use tempfile::NamedTempFile;

use crate::domain::DonorDraft;

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl FixtureClock {
    pub fn new(utc_now: DateTime<Utc>) -> Self {
        Self { utc_now }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Midnight UTC on the given day.
///
/// # Panics
/// Panics when the date does not exist.
pub fn utc_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single() {
        Some(instant) => instant,
        None => panic!("invalid fixture date {year}-{month}-{day}"),
    }
}

/// Clock frozen at 2024-05-31T00:00:00Z, so the eligibility cutoff is
/// 2024-03-02T00:00:00Z.
pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock::new(utc_date(2024, 5, 31)))
}

/// Complete donor draft with the given email.
pub fn donor_draft(email: &str) -> DonorDraft {
    DonorDraft {
        name: Some("Test Donor".to_owned()),
        age: Some(30),
        blood_group: Some("O+".to_owned()),
        contact_number: Some("555-0100".to_owned()),
        email: Some(email.to_owned()),
        address: Some("1 Test Street".to_owned()),
        ..DonorDraft::default()
    }
}

/// Write `contents` to a fresh temporary `.csv` file.
///
/// The file is removed when the returned handle drops.
pub fn write_csv(contents: &str) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}
