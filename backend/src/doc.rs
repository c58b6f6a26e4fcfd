//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every donor endpoint, the health probes, and the
//! domain error wrappers ([`ErrorSchema`], [`ErrorCodeSchema`]) that keep
//! domain types free of utoipa derives.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::donors::{
    BloodGroupStatBody, CreateDonorRequestBody, DonorResponseBody, DonorStatsBody,
    ImportDonorsRequestBody, ImportIssueBody, ImportReportBody, UpdateDonorRequestBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Donor registry API",
        description = "Donor records, CSV bulk import, eligibility queries and blood group statistics."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::donors::list_donors,
        crate::inbound::http::donors::create_donor,
        crate::inbound::http::donors::donor_stats,
        crate::inbound::http::donors::donors_by_blood_group,
        crate::inbound::http::donors::import_donors,
        crate::inbound::http::donors::get_donor,
        crate::inbound::http::donors::update_donor,
        crate::inbound::http::donors::delete_donor,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        DonorResponseBody,
        CreateDonorRequestBody,
        UpdateDonorRequestBody,
        DonorStatsBody,
        BloodGroupStatBody,
        ImportDonorsRequestBody,
        ImportReportBody,
        ImportIssueBody,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "donors", description = "Donor records and bulk import"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/donors")]
    #[case("/api/donors/stats")]
    #[case("/api/donors/blood-group/{bloodGroup}")]
    #[case("/api/donors/import")]
    #[case("/api/donors/{id}")]
    #[case("/health/ready")]
    fn document_lists_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn donor_schema_uses_camel_case() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let donor = schemas.get("DonorResponseBody").expect("donor schema");

        assert_object_schema_has_field(donor, "bloodGroup");
        assert_object_schema_has_field(donor, "lastDonationDate");
    }
}
