//! Donor HTTP handlers.
//!
//! ```text
//! GET    /api/donors
//! POST   /api/donors
//! GET    /api/donors/stats
//! GET    /api/donors/blood-group/{bloodGroup}
//! POST   /api/donors/import
//! GET    /api/donors/{id}
//! PUT    /api/donors/{id}
//! DELETE /api/donors/{id}
//! ```
//!
//! Literal segments are registered before `{id}` so `stats` and `import`
//! never reach the identifier routes.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    BloodGroupStat, DonorImportReport, DonorImportRequest, DonorStats, ImportIssue,
    ListDonorsRequest,
};
use crate::domain::{Donor, DonorDraft, DonorPatch, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_bool, parse_optional_date, resolve_import_path,
};

/// Donor record returned by every donor endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub age: i32,
    #[schema(example = "O+")]
    pub blood_group: String,
    pub contact_number: String,
    pub email: String,
    pub address: String,
    #[schema(format = "date-time")]
    pub last_donation_date: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<Donor> for DonorResponseBody {
    fn from(donor: Donor) -> Self {
        let record = donor.record();
        Self {
            id: donor.id().to_string(),
            name: record.name().to_owned(),
            age: record.age(),
            blood_group: record.blood_group().to_string(),
            contact_number: record.contact_number().to_owned(),
            email: record.email().to_string(),
            address: record.address().to_owned(),
            last_donation_date: record.last_donation_date().map(|date| date.to_rfc3339()),
            latitude: record.latitude(),
            longitude: record.longitude(),
            created_at: donor.created_at().to_rfc3339(),
            updated_at: donor.updated_at().to_rfc3339(),
        }
    }
}

fn to_bodies(donors: Vec<Donor>) -> Vec<DonorResponseBody> {
    donors.into_iter().map(DonorResponseBody::from).collect()
}

/// Request payload for creating a donor.
///
/// Every field except the date and coordinates is required; presence is
/// checked by the domain so the error names the missing field.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonorRequestBody {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub blood_group: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339.
    pub last_donation_date: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TryFrom<CreateDonorRequestBody> for DonorDraft {
    type Error = Error;

    fn try_from(body: CreateDonorRequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            last_donation_date: parse_optional_date(
                body.last_donation_date,
                FieldName::new("lastDonationDate"),
            )?,
            name: body.name,
            age: body.age,
            blood_group: body.blood_group,
            contact_number: body.contact_number,
            email: body.email,
            address: body.address,
            latitude: body.latitude,
            longitude: body.longitude,
        })
    }
}

/// Distinguish an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Request payload for a partial donor update.
///
/// Omitted fields are left untouched. `null` clears the optional fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDonorRequestBody {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub blood_group: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, nullable)]
    pub last_donation_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<f64>, nullable)]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<f64>, nullable)]
    pub longitude: Option<Option<f64>>,
}

impl TryFrom<UpdateDonorRequestBody> for DonorPatch {
    type Error = Error;

    fn try_from(body: UpdateDonorRequestBody) -> Result<Self, Self::Error> {
        let last_donation_date = body
            .last_donation_date
            .map(|value| parse_optional_date(value, FieldName::new("lastDonationDate")))
            .transpose()?;
        Ok(Self {
            name: body.name,
            age: body.age,
            blood_group: body.blood_group,
            contact_number: body.contact_number,
            email: body.email,
            address: body.address,
            last_donation_date,
            latitude: body.latitude,
            longitude: body.longitude,
        })
    }
}

/// Query parameters for listing donors.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListDonorsQuery {
    /// Exact blood group match, case-insensitive.
    pub blood_group: Option<String>,
    /// `true` keeps donors who never donated or donated at least 90 days ago.
    #[param(value_type = Option<bool>)]
    pub is_eligible: Option<String>,
}

/// Per blood group aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodGroupStatBody {
    pub blood_group: String,
    pub count: u64,
    pub average_age: f64,
}

impl From<BloodGroupStat> for BloodGroupStatBody {
    fn from(stat: BloodGroupStat) -> Self {
        Self {
            blood_group: stat.blood_group.to_string(),
            count: stat.count,
            average_age: stat.average_age,
        }
    }
}

/// Donor statistics payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorStatsBody {
    /// Ordered by blood group label ascending.
    pub groups: Vec<BloodGroupStatBody>,
    pub total: u64,
}

impl From<DonorStats> for DonorStatsBody {
    fn from(stats: DonorStats) -> Self {
        Self {
            groups: stats.groups.into_iter().map(Into::into).collect(),
            total: stats.total,
        }
    }
}

/// Request payload for a server-side CSV import.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportDonorsRequestBody {
    /// CSV file path relative to the server's import directory.
    #[schema(example = "batch-2024-05.csv")]
    pub path: String,
}

/// One row-level import problem.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportIssueBody {
    /// Row with an empty name or email; never a candidate.
    Parse {
        line: u64,
        row: BTreeMap<String, String>,
        reason: String,
    },
    /// Row rejected by record validation or the store.
    Failed {
        line: u64,
        row: BTreeMap<String, String>,
        message: String,
    },
    /// Row whose email is already registered.
    Duplicate {
        line: u64,
        email: String,
        message: String,
    },
}

impl From<ImportIssue> for ImportIssueBody {
    fn from(issue: ImportIssue) -> Self {
        match issue {
            ImportIssue::Parse { line, row, reason } => Self::Parse { line, row, reason },
            ImportIssue::Failed { line, row, message } => Self::Failed { line, row, message },
            ImportIssue::Duplicate {
                line,
                email,
                message,
            } => Self::Duplicate {
                line,
                email,
                message,
            },
        }
    }
}

/// Import outcome payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReportBody {
    /// Rows that passed parsing and were offered to the store.
    pub total: u64,
    pub successful: u64,
    pub duplicates: u64,
    pub failed: u64,
    /// Parse errors, then failed candidates, then duplicates.
    pub errors: Vec<ImportIssueBody>,
}

impl From<DonorImportReport> for ImportReportBody {
    fn from(report: DonorImportReport) -> Self {
        Self {
            total: report.total,
            successful: report.successful,
            duplicates: report.duplicates,
            failed: report.failed,
            errors: report.errors.into_iter().map(Into::into).collect(),
        }
    }
}

/// List donors, newest first.
#[utoipa::path(
    get,
    path = "/api/donors",
    params(ListDonorsQuery),
    responses(
        (status = 200, description = "Matching donors", body = [DonorResponseBody]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "listDonors"
)]
#[get("/donors")]
pub async fn list_donors(
    state: web::Data<HttpState>,
    query: web::Query<ListDonorsQuery>,
) -> ApiResult<web::Json<Vec<DonorResponseBody>>> {
    let ListDonorsQuery {
        blood_group,
        is_eligible,
    } = query.into_inner();
    let request = ListDonorsRequest {
        blood_group,
        is_eligible: parse_optional_bool(is_eligible.as_deref(), FieldName::new("isEligible"))?,
    };

    let donors = state.donors_query.list_donors(request).await?;
    Ok(web::Json(to_bodies(donors)))
}

/// Create a donor.
#[utoipa::path(
    post,
    path = "/api/donors",
    request_body = CreateDonorRequestBody,
    responses(
        (status = 201, description = "Donor created", body = DonorResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "createDonor"
)]
#[post("/donors")]
pub async fn create_donor(
    state: web::Data<HttpState>,
    payload: web::Json<CreateDonorRequestBody>,
) -> ApiResult<HttpResponse> {
    let draft = DonorDraft::try_from(payload.into_inner())?;
    let donor = state.donors.create_donor(draft).await?;
    Ok(HttpResponse::Created().json(DonorResponseBody::from(donor)))
}

/// Count and average age per blood group.
#[utoipa::path(
    get,
    path = "/api/donors/stats",
    responses(
        (status = 200, description = "Donor statistics", body = DonorStatsBody),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "donorStats"
)]
#[get("/donors/stats")]
pub async fn donor_stats(state: web::Data<HttpState>) -> ApiResult<web::Json<DonorStatsBody>> {
    let stats = state.donors_query.donor_stats().await?;
    Ok(web::Json(stats.into()))
}

/// Donors with one blood group.
#[utoipa::path(
    get,
    path = "/api/donors/blood-group/{bloodGroup}",
    params(("bloodGroup" = String, Path, description = "Blood group label, e.g. `AB-`")),
    responses(
        (status = 200, description = "Matching donors", body = [DonorResponseBody]),
        (status = 400, description = "Empty blood group", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "donorsByBloodGroup"
)]
#[get("/donors/blood-group/{blood_group}")]
pub async fn donors_by_blood_group(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<DonorResponseBody>>> {
    let donors = state
        .donors_query
        .donors_by_blood_group(path.as_str())
        .await?;
    Ok(web::Json(to_bodies(donors)))
}

/// Import donors from a CSV file in the server's import directory.
///
/// Absolute paths and `..` segments are rejected before the file is opened.
#[utoipa::path(
    post,
    path = "/api/donors/import",
    request_body = ImportDonorsRequestBody,
    responses(
        (status = 200, description = "Import report", body = ImportReportBody),
        (status = 400, description = "Path outside the import directory or unreadable file", body = ErrorSchema),
        (status = 404, description = "File not found", body = ErrorSchema),
        (status = 422, description = "No valid records", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "importDonors"
)]
#[post("/donors/import")]
pub async fn import_donors(
    state: web::Data<HttpState>,
    payload: web::Json<ImportDonorsRequestBody>,
) -> ApiResult<web::Json<ImportReportBody>> {
    let requested = payload.into_inner().path;
    let path = resolve_import_path(&state.import_root, &requested, FieldName::new("path"))?;
    let request = DonorImportRequest { path };
    let report = state.donor_import.import_csv(request).await?;
    Ok(web::Json(report.into()))
}

/// Fetch one donor.
#[utoipa::path(
    get,
    path = "/api/donors/{id}",
    params(("id" = String, Path, description = "Donor identifier")),
    responses(
        (status = 200, description = "Donor", body = DonorResponseBody),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Donor not found", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "getDonor"
)]
#[get("/donors/{id}")]
pub async fn get_donor(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonorResponseBody>> {
    let donor = state.donors_query.get_donor(path.as_str()).await?;
    Ok(web::Json(donor.into()))
}

/// Partially update a donor.
#[utoipa::path(
    put,
    path = "/api/donors/{id}",
    params(("id" = String, Path, description = "Donor identifier")),
    request_body = UpdateDonorRequestBody,
    responses(
        (status = 200, description = "Updated donor", body = DonorResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Donor not found", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "updateDonor"
)]
#[put("/donors/{id}")]
pub async fn update_donor(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateDonorRequestBody>,
) -> ApiResult<web::Json<DonorResponseBody>> {
    let patch = DonorPatch::try_from(payload.into_inner())?;
    let donor = state.donors.update_donor(path.as_str(), patch).await?;
    Ok(web::Json(donor.into()))
}

/// Delete a donor, returning the removed record.
#[utoipa::path(
    delete,
    path = "/api/donors/{id}",
    params(("id" = String, Path, description = "Donor identifier")),
    responses(
        (status = 200, description = "Deleted donor", body = DonorResponseBody),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Donor not found", body = ErrorSchema)
    ),
    tags = ["donors"],
    operation_id = "deleteDonor"
)]
#[delete("/donors/{id}")]
pub async fn delete_donor(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonorResponseBody>> {
    let donor = state.donors.delete_donor(path.as_str()).await?;
    Ok(web::Json(donor.into()))
}

/// Register donor routes on an `/api` scope.
///
/// Literal routes go first so they win over `/donors/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(donor_stats)
        .service(import_donors)
        .service(donors_by_blood_group)
        .service(list_donors)
        .service(create_donor)
        .service(get_donor)
        .service(update_donor)
        .service(delete_donor);
}

#[cfg(test)]
#[path = "donors_tests.rs"]
mod tests;
