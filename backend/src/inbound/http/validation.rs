//! Shared validation helpers for inbound HTTP adapters.
//!
//! Failures become `invalid_request` errors whose details name the offending
//! field, the rejected value and a machine-readable code.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{Error, parse_donation_date};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidDate,
    InvalidBoolean,
    InvalidImportPath,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidBoolean => "invalid_boolean",
            ErrorCode::InvalidImportPath => "invalid_import_path",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn invalid_value(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn invalid_date_error(field: FieldName, value: &str) -> Error {
    invalid_value(
        field,
        format!("{} must be a date (YYYY-MM-DD) or RFC 3339 timestamp", field.as_str()),
        ErrorCode::InvalidDate,
        value,
    )
}

/// Parse a donation date in any format the CSV importer accepts.
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<DateTime<Utc>, Error> {
    parse_donation_date(value).ok_or_else(|| invalid_date_error(field, value))
}

pub(crate) fn parse_optional_date(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value.map(|raw| parse_date(&raw, field)).transpose()
}

/// Parse `true`/`false` (any case) from a query parameter.
pub(crate) fn parse_optional_bool(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<bool>, Error> {
    value
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(invalid_value(
                field,
                format!("{} must be true or false", field.as_str()),
                ErrorCode::InvalidBoolean,
                raw,
            )),
        })
        .transpose()
}

fn invalid_import_path(field: FieldName, requested: &str) -> Error {
    invalid_value(
        field,
        format!(
            "{} must be a relative path inside the import directory",
            field.as_str()
        ),
        ErrorCode::InvalidImportPath,
        requested,
    )
}

fn canonical_or_not_found(path: &Path, requested: &str) -> Result<PathBuf, Error> {
    path.canonicalize().map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => {
            Error::file_not_found(format!("import file not found: {requested}"))
        }
        _ => Error::file_not_found(format!("import file is not accessible: {requested}")),
    })
}

/// Resolve a client-supplied import path against `root`.
///
/// Only plain relative paths are accepted. The resolved file must still lie
/// under the canonical `root` once symlinks are followed.
pub(crate) fn resolve_import_path(
    root: &Path,
    requested: &str,
    field: FieldName,
) -> Result<PathBuf, Error> {
    let relative = Path::new(requested.trim());
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if relative.as_os_str().is_empty() || !plain {
        return Err(invalid_import_path(field, requested));
    }

    let root = canonical_or_not_found(root, requested)?;
    let resolved = canonical_or_not_found(&root.join(relative), requested)?;
    if !resolved.starts_with(&root) {
        return Err(invalid_import_path(field, requested));
    }
    Ok(resolved)
}
