//! Tests for server construction and app wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use backend::domain::TRACE_ID_HEADER;
use backend::test_support::fixture_clock;

use super::*;

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

#[fixture]
fn bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

fn deps(health_state: web::Data<HealthState>) -> AppDependencies {
    let repo = Arc::new(backend::outbound::memory::InMemoryDonorRepository::new(
        fixture_clock(),
    ));
    let service = Arc::new(backend::domain::DonorService::new(
        repo.clone(),
        fixture_clock(),
    ));
    let import = Arc::new(backend::domain::DonorImportService::new(
        Arc::new(backend::outbound::CsvDonorSource),
        repo,
    ));
    AppDependencies {
        health_state,
        http_state: web::Data::new(HttpState::new(service.clone(), service, import)),
    }
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(health_state: web::Data<HealthState>, bind_addr: SocketAddr) {
    let _server = create_server(health_state.clone(), ServerConfig::new(bind_addr))
        .expect("server should bind");

    assert!(health_state.is_ready());
}

#[rstest]
#[actix_web::test]
async fn donor_routes_are_mounted_under_api(health_state: web::Data<HealthState>) {
    let app = actix_test::init_service(build_app(deps(health_state))).await;

    let req = actix_test::TestRequest::get().uri("/api/donors").to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
}

#[rstest]
#[actix_web::test]
async fn malformed_json_uses_error_envelope(health_state: web::Data<HealthState>) {
    let app = actix_test::init_service(build_app(deps(health_state))).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/donors")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"name\": ")
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], json!("invalid_request"));
}

#[rstest]
#[actix_web::test]
async fn readiness_follows_health_state(health_state: web::Data<HealthState>) {
    let app = actix_test::init_service(build_app(deps(health_state.clone()))).await;

    let before = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;
    health_state.mark_ready();
    let after = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;

    assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(after.status(), StatusCode::OK);
}
