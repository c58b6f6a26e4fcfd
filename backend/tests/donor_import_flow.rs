//! End-to-end donor flows over HTTP with the in-memory store.
//!
//! Exercises the real CSV source, import service, donor service and Actix
//! routing together; only the store is swapped for process memory.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use backend::Trace;
use backend::domain::ports::DonorImportCommand;
use backend::domain::{DonorImportService, DonorService, TRACE_ID_HEADER};
use backend::inbound::http::donors;
use backend::inbound::http::state::HttpState;
use backend::outbound::CsvDonorSource;
use backend::outbound::memory::InMemoryDonorRepository;
use backend::test_support::{fixture_clock, write_csv};
use rstest::rstest;
use serde_json::{Value, json};

const CSV_HEADER: &str =
    "name,age,blood_group,contact_number,email,address,last_donation_date,latitude,longitude";

fn state() -> HttpState {
    let repo = Arc::new(InMemoryDonorRepository::new(fixture_clock()));
    let service = Arc::new(DonorService::new(repo.clone(), fixture_clock()));
    let import: Arc<dyn DonorImportCommand> =
        Arc::new(DonorImportService::new(Arc::new(CsvDonorSource), repo));
    HttpState::new(service.clone(), service, import).with_import_root(std::env::temp_dir())
}

fn import_body(file: &tempfile::NamedTempFile) -> Value {
    let name = file
        .path()
        .file_name()
        .and_then(|name| name.to_str())
        .expect("utf-8 file name");
    json!({ "path": name })
}

fn csv(rows: &[&str]) -> String {
    let mut contents = String::from(CSV_HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    contents
}

#[rstest]
#[actix_web::test]
async fn imported_donors_are_queryable() {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state()))
            .wrap(Trace)
            .service(web::scope("/api").configure(donors::configure)),
    )
    .await;
    let file = write_csv(&csv(&[
        "Ada Lovelace,36,o+,555-0100,ada@example.com,1 Analytical Row,2024-01-15,51.5,-0.12",
        "Grace Hopper,45,A-,555-0101,grace@example.com,2 Compiler Way,2024-05-20,,",
        "\"Hopper, Grace\",45,A-,555-0102,GRACE@example.com,3 Navy Yard,,,",
        "Linus,unknown,B+,555-0103,linus@example.com,4 Kernel St,,north,",
        ",30,AB+,555-0104,nameless@example.com,5 Void Ave,,,",
        "Katherine Johnson,52,O+,555-0105,katherine@example.com,6 Orbit Rd,,,",
    ]))
    .expect("write csv");

    let import = actix_test::TestRequest::post()
        .uri("/api/donors/import")
        .set_json(import_body(&file))
        .to_request();
    let res = actix_test::call_service(&app, import).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
    let report: Value = actix_test::read_body_json(res).await;

    assert_eq!(report["total"], 5);
    assert_eq!(report["successful"], 4);
    assert_eq!(report["duplicates"], 1);
    assert_eq!(report["failed"], 0);
    let kinds: Vec<(&str, u64)> = report["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|issue| Some((issue["kind"].as_str()?, issue["line"].as_u64()?)))
        .collect();
    assert_eq!(kinds, [("parse", 6), ("duplicate", 4)]);

    let eligible = actix_test::TestRequest::get()
        .uri("/api/donors?isEligible=true")
        .to_request();
    let eligible: Vec<Value> = actix_test::call_and_read_body_json(&app, eligible).await;
    let mut emails: Vec<&str> = eligible
        .iter()
        .filter_map(|donor| donor["email"].as_str())
        .collect();
    emails.sort_unstable();
    assert_eq!(
        emails,
        ["ada@example.com", "katherine@example.com", "linus@example.com"]
    );

    let stats = actix_test::TestRequest::get()
        .uri("/api/donors/stats")
        .to_request();
    let stats: Value = actix_test::call_and_read_body_json(&app, stats).await;
    assert_eq!(stats["total"], 4);
    let groups: Vec<&str> = stats["groups"]
        .as_array()
        .expect("groups array")
        .iter()
        .filter_map(|group| group["bloodGroup"].as_str())
        .collect();
    assert_eq!(groups, ["A-", "B+", "O+"]);
    assert_eq!(stats["groups"][2]["averageAge"], 44.0);
}

#[rstest]
#[actix_web::test]
async fn reimporting_the_same_file_only_reports_duplicates() {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state()))
            .service(web::scope("/api").configure(donors::configure)),
    )
    .await;
    let file = write_csv(&csv(&[
        "Ada,36,O+,555,ada@example.com,1 Row,,,",
        "Grace,45,A-,555,grace@example.com,2 Row,,,",
    ]))
    .expect("write csv");
    let body = import_body(&file);

    let first = actix_test::TestRequest::post()
        .uri("/api/donors/import")
        .set_json(&body)
        .to_request();
    let first: Value = actix_test::call_and_read_body_json(&app, first).await;
    let second = actix_test::TestRequest::post()
        .uri("/api/donors/import")
        .set_json(&body)
        .to_request();
    let second: Value = actix_test::call_and_read_body_json(&app, second).await;

    assert_eq!(first["successful"], 2);
    assert_eq!(second["successful"], 0);
    assert_eq!(second["duplicates"], 2);
}
