//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed donor entities and the services that
//! implement the driving ports. Types here never depend on HTTP, Diesel, or
//! the CSV reader; adapters translate at the edges.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Donor, NewDonor, DonorDraft, DonorPatch: record model shapes.
//! - DonorService, DonorImportService: driving port implementations.

pub mod donor;
pub mod donor_import;
pub mod donor_service;
pub mod error;
pub mod ports;
pub mod trace_id;

pub use self::donor::{
    BloodGroup, Donor, DonorDraft, DonorId, DonorPatch, DonorValidationError,
    ELIGIBILITY_WINDOW_DAYS, EmailAddress, NewDonor, eligibility_cutoff, is_eligible,
    parse_donation_date,
};
pub use self::donor_import::{DUPLICATE_EMAIL_MESSAGE, DonorImportService};
pub use self::donor_service::DonorService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such donor"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
