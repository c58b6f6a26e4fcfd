//! Driving port for bulk CSV donor imports.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Error;

/// Command request for one import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorImportRequest {
    /// Path to the CSV file on the server's filesystem.
    pub path: PathBuf,
}

/// One row-level problem recorded during an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportIssue {
    /// The row has an empty name or email and was never a candidate.
    Parse {
        line: u64,
        row: BTreeMap<String, String>,
        reason: String,
    },
    /// The candidate failed record validation or was rejected by the store.
    Failed {
        line: u64,
        row: BTreeMap<String, String>,
        message: String,
    },
    /// The store already holds a donor with this email.
    Duplicate {
        line: u64,
        email: String,
        message: String,
    },
}

impl ImportIssue {
    /// Line in the source file the issue refers to.
    pub fn line(&self) -> u64 {
        match self {
            Self::Parse { line, .. } | Self::Failed { line, .. } | Self::Duplicate { line, .. } => {
                *line
            }
        }
    }

    /// Wire tag of the issue kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Failed { .. } => "failed",
            Self::Duplicate { .. } => "duplicate",
        }
    }
}

/// Outcome accounting for one import run.
///
/// `total` counts candidates only; rows rejected as parse errors appear in
/// `errors` but not in `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorImportReport {
    pub total: u64,
    pub successful: u64,
    pub duplicates: u64,
    pub failed: u64,
    /// Parse errors, then failed candidates, then duplicates; each group in
    /// source row order.
    pub errors: Vec<ImportIssue>,
}

/// Driving port for CSV imports.
#[async_trait]
pub trait DonorImportCommand: Send + Sync {
    /// Stream the file, persisting each candidate in turn.
    ///
    /// Fails only with `FileNotFound`, `NoValidRecords`, or a mid-stream read
    /// failure; every row-level problem lands in the report.
    async fn import_csv(&self, request: DonorImportRequest) -> Result<DonorImportReport, Error>;
}
