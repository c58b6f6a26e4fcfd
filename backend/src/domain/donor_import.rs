//! CSV donor import pipeline.
//!
//! Each row is transformed, validated and persisted before the next row is
//! taken from the source. Row-level problems are recorded in the report;
//! only a missing file, an unreadable stream, or a file without a single
//! candidate fails the whole import. Rows persisted before a failure stay
//! persisted.
//!
//! The source does blocking file I/O, so it runs on Tokio's blocking pool
//! and hands rows over a bounded channel, so the reader stays a fixed
//! number of rows ahead of the store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    DonorImportCommand, DonorImportReport, DonorImportRequest, DonorRepository,
    DonorRepositoryError, DonorSource, DonorSourceError, ImportIssue, RawDonorRow,
};
use crate::domain::{DonorDraft, Error, NewDonor, parse_donation_date};

/// Message recorded against rows whose email is already registered.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already exists";

/// Rows read ahead of the row currently being persisted.
const ROW_BUFFER: usize = 64;

type RowResult = Result<RawDonorRow, DonorSourceError>;

/// Domain service implementing the CSV import command.
#[derive(Clone)]
pub struct DonorImportService<S, R> {
    source: Arc<S>,
    donor_repo: Arc<R>,
}

impl<S, R> DonorImportService<S, R> {
    /// Create an import service reading from `source` into `donor_repo`.
    pub fn new(source: Arc<S>, donor_repo: Arc<R>) -> Self {
        Self { source, donor_repo }
    }
}

#[async_trait]
impl<S, R> DonorImportCommand for DonorImportService<S, R>
where
    S: DonorSource + 'static,
    R: DonorRepository,
{
    async fn import_csv(&self, request: DonorImportRequest) -> Result<DonorImportReport, Error> {
        let path = request.path;
        info!(path = %path.display(), "donor import started");

        let (mut rows, reader) = spawn_reader(self.source.clone(), path.clone());
        let mut tally = ImportTally::default();
        while let Some(row) = rows.recv().await {
            let row = row.map_err(|err| {
                if matches!(err, DonorSourceError::Read { .. }) {
                    warn!(path = %path.display(), error = %err, "donor import aborted");
                }
                map_source_error(err)
            })?;
            self.import_row(row, &mut tally).await;
        }
        reader.await.map_err(|err| {
            Error::internal(format!("donor import reader stopped unexpectedly: {err}"))
        })?;

        if tally.total == 0 {
            warn!(
                path = %path.display(),
                parse_errors = tally.parse_errors.len(),
                "donor import found no valid records"
            );
            let mut error = Error::no_valid_records("no valid records found in the import file");
            if let Ok(errors) = serde_json::to_value(&tally.parse_errors) {
                let details = serde_json::Map::from_iter([("errors".to_owned(), errors)]);
                error = error.with_details(details.into());
            }
            return Err(error);
        }

        let report = tally.into_report();
        info!(
            path = %path.display(),
            total = report.total,
            successful = report.successful,
            duplicates = report.duplicates,
            failed = report.failed,
            "donor import finished"
        );
        Ok(report)
    }
}

/// Open `path` on the blocking pool and forward its rows in file order.
///
/// An open failure is sent as the only item. The reader stops after the
/// first read error or once the receiver is dropped.
fn spawn_reader<S>(
    source: Arc<S>,
    path: PathBuf,
) -> (mpsc::Receiver<RowResult>, tokio::task::JoinHandle<()>)
where
    S: DonorSource + 'static,
{
    let (tx, rx) = mpsc::channel(ROW_BUFFER);
    let reader = tokio::task::spawn_blocking(move || {
        let rows = match source.open(&path) {
            Ok(rows) => rows,
            Err(err) => {
                let _ = tx.blocking_send(Err(err));
                return;
            }
        };
        for row in rows {
            let failed = row.is_err();
            if tx.blocking_send(row).is_err() || failed {
                break;
            }
        }
    });
    (rx, reader)
}

impl<S, R> DonorImportService<S, R>
where
    R: DonorRepository,
{
    async fn import_row(&self, row: RawDonorRow, tally: &mut ImportTally) {
        let line = row.line;
        let candidate = match transform_row(&row) {
            Ok(candidate) => candidate,
            Err(reason) => {
                tally.record(ImportIssue::Parse {
                    line,
                    row: row.fields,
                    reason,
                });
                return;
            }
        };

        tally.total += 1;
        let record = match candidate.into_record() {
            Ok(record) => record,
            Err(message) => {
                tally.record(ImportIssue::Failed {
                    line,
                    row: row.fields,
                    message,
                });
                return;
            }
        };

        match self.donor_repo.create(&record).await {
            Ok(donor) => {
                debug!(line, id = %donor.id(), "row imported");
                tally.successful += 1;
            }
            Err(DonorRepositoryError::DuplicateEmail { email }) => {
                tally.record(ImportIssue::Duplicate {
                    line,
                    email,
                    message: DUPLICATE_EMAIL_MESSAGE.to_owned(),
                });
            }
            Err(err) => {
                tally.record(ImportIssue::Failed {
                    line,
                    row: row.fields,
                    message: err.to_string(),
                });
            }
        }
    }
}

/// Running counts plus one issue list per kind.
#[derive(Debug, Default)]
struct ImportTally {
    total: u64,
    successful: u64,
    duplicates: u64,
    failed: u64,
    parse_errors: Vec<ImportIssue>,
    failures: Vec<ImportIssue>,
    duplicate_entries: Vec<ImportIssue>,
}

impl ImportTally {
    fn record(&mut self, issue: ImportIssue) {
        debug!(line = issue.line(), kind = issue.kind(), "row issue recorded");
        match issue {
            ImportIssue::Parse { .. } => self.parse_errors.push(issue),
            ImportIssue::Failed { .. } => {
                self.failed += 1;
                self.failures.push(issue);
            }
            ImportIssue::Duplicate { .. } => {
                self.duplicates += 1;
                self.duplicate_entries.push(issue);
            }
        }
    }

    /// Parse errors, then failed candidates, then duplicates.
    fn into_report(self) -> DonorImportReport {
        let errors = self
            .parse_errors
            .into_iter()
            .chain(self.failures)
            .chain(self.duplicate_entries)
            .collect();
        DonorImportReport {
            total: self.total,
            successful: self.successful,
            duplicates: self.duplicates,
            failed: self.failed,
            errors,
        }
    }
}

/// A row that passed the name/email check.
///
/// A donation date that does not parse is kept raw so record validation can
/// fail the candidate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImportCandidate {
    pub(crate) draft: DonorDraft,
    pub(crate) unparsed_date: Option<String>,
}

impl ImportCandidate {
    fn into_record(self) -> Result<NewDonor, String> {
        if let Some(raw) = self.unparsed_date {
            return Err(format!("last_donation_date is not a valid date: {raw}"));
        }
        NewDonor::try_from(self.draft).map_err(|err| err.to_string())
    }
}

fn trimmed(row: &RawDonorRow, column: &str) -> Option<String> {
    Some(row.field(column).trim().to_owned())
}

/// Shape one raw row into a candidate, or explain why it is not one.
///
/// Only an empty name or an empty email reject the row. Age falls back to 0
/// and bad coordinates are dropped.
pub(crate) fn transform_row(row: &RawDonorRow) -> Result<ImportCandidate, String> {
    let name = row.field("name").trim();
    if name.is_empty() {
        return Err("name is required".to_owned());
    }
    let email = row.field("email").trim().to_lowercase();
    if email.is_empty() {
        return Err("email is required".to_owned());
    }

    let raw_date = row.field("last_donation_date").trim();
    let (last_donation_date, unparsed_date) = if raw_date.is_empty() {
        (None, None)
    } else {
        match parse_donation_date(raw_date) {
            Some(date) => (Some(date), None),
            None => (None, Some(raw_date.to_owned())),
        }
    };

    let draft = DonorDraft {
        name: Some(name.to_owned()),
        age: Some(row.field("age").trim().parse().unwrap_or(0)),
        blood_group: Some(row.field("blood_group").trim().to_uppercase()),
        contact_number: trimmed(row, "contact_number"),
        email: Some(email),
        address: trimmed(row, "address"),
        last_donation_date,
        latitude: row.field("latitude").trim().parse().ok(),
        longitude: row.field("longitude").trim().parse().ok(),
    };
    Ok(ImportCandidate {
        draft,
        unparsed_date,
    })
}

fn map_source_error(error: DonorSourceError) -> Error {
    match error {
        DonorSourceError::NotFound { path } => {
            Error::file_not_found(format!("import file not found: {path}"))
        }
        DonorSourceError::Read { message } => {
            Error::invalid_request(format!("import file could not be read: {message}"))
        }
    }
}

#[cfg(test)]
#[path = "donor_import_tests.rs"]
mod tests;
