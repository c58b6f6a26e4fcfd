//! Outbound adapter streaming donor rows from CSV files with the `csv` crate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::domain::ports::{DonorRowStream, DonorSource, DonorSourceError, RawDonorRow};

/// CSV file source.
///
/// Header names are trimmed and lowercased before matching. Rows may be
/// ragged: surplus cells are dropped and missing cells read as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvDonorSource;

impl DonorSource for CsvDonorSource {
    fn open(&self, path: &Path) -> Result<DonorRowStream, DonorSourceError> {
        let not_found = || DonorSourceError::not_found(path.display().to_string());
        let metadata = path.metadata().map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }
        let file = File::open(path).map_err(|_| not_found())?;

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));
        let headers = reader
            .headers()
            .map_err(map_csv_error)?
            .iter()
            .map(|header| header.trim().to_lowercase())
            .collect();

        Ok(Box::new(CsvRows {
            headers,
            records: reader.into_records(),
        }))
    }
}

struct CsvRows {
    headers: Vec<String>,
    records: StringRecordsIntoIter<BufReader<File>>,
}

impl CsvRows {
    fn to_row(&self, record: &StringRecord) -> RawDonorRow {
        let line = record.position().map_or(0, csv::Position::line);
        RawDonorRow::new(line, self.headers.iter().cloned().zip(record.iter()))
    }
}

impl Iterator for CsvRows {
    type Item = Result<RawDonorRow, DonorSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map(|record| self.to_row(&record)).map_err(map_csv_error))
    }
}

fn map_csv_error(error: csv::Error) -> DonorSourceError {
    DonorSourceError::read(error.to_string())
}
