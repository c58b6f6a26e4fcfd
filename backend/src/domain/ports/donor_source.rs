//! Driven port for reading raw donor rows from an import file.
//!
//! The source yields rows lazily, one at a time and in file order. It does
//! no trimming or validation; that belongs to the ingestion pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::define_port_error;

define_port_error! {
    /// Errors raised by donor row sources.
    pub enum DonorSourceError {
        /// The path does not resolve to a readable file.
        NotFound { path: String } => "import file not found: {path}",
        /// The file could not be read or decoded mid-stream.
        Read { message: String } => "import file could not be read: {message}",
    }
}

/// One data row keyed by lowercase column name, with its line in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawDonorRow {
    pub line: u64,
    pub fields: BTreeMap<String, String>,
}

impl RawDonorRow {
    /// Build a row from `(column, value)` pairs.
    pub fn new<K, V>(line: u64, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            line,
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Raw value for `column`, or `""` when the column is absent.
    pub fn field(&self, column: &str) -> &str {
        self.fields.get(column).map_or("", String::as_str)
    }
}

/// Single-pass, non-restartable sequence of rows.
pub type DonorRowStream = Box<dyn Iterator<Item = Result<RawDonorRow, DonorSourceError>> + Send>;

/// Port for opening an import file as a row stream.
#[cfg_attr(test, mockall::automock)]
pub trait DonorSource: Send + Sync {
    /// Open `path` for streaming.
    ///
    /// Fails with [`DonorSourceError::NotFound`] before yielding anything when
    /// the path is missing, unreadable or not a regular file.
    fn open(&self, path: &Path) -> Result<DonorRowStream, DonorSourceError>;
}
