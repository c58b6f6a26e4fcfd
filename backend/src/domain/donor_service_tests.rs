//! Tests for the donor query and command service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{BloodGroupStat, MockDonorRepository};
use crate::outbound::memory::InMemoryDonorRepository;
use crate::test_support::{donor_draft, fixture_clock, utc_date};

type Service = DonorService<InMemoryDonorRepository>;

#[fixture]
fn service() -> Service {
    DonorService::new(
        Arc::new(InMemoryDonorRepository::new(fixture_clock())),
        fixture_clock(),
    )
}

fn draft(email: &str, blood_group: &str, age: i32) -> DonorDraft {
    DonorDraft {
        blood_group: Some(blood_group.to_owned()),
        age: Some(age),
        ..donor_draft(email)
    }
}

#[rstest]
#[tokio::test]
async fn create_normalises_and_persists(service: Service) {
    let created = service
        .create_donor(draft(" Mixed@Case.ORG ", " ab- ", 41))
        .await
        .expect("create succeeds");

    assert_eq!(created.record().email().as_ref(), "mixed@case.org");
    assert_eq!(created.record().blood_group().as_ref(), "AB-");
    let fetched = service
        .get_donor(&created.id().to_string())
        .await
        .expect("get succeeds");
    assert_eq!(fetched, created);
}

#[rstest]
#[tokio::test]
async fn create_rejects_case_variant_duplicate(service: Service) {
    service
        .create_donor(draft("a@b.com", "A+", 30))
        .await
        .expect("first create");

    let error = service
        .create_donor(draft("A@B.com", "A+", 30))
        .await
        .expect_err("duplicate email");

    assert_eq!(error.code(), ErrorCode::DuplicateEmail);
}

#[rstest]
#[tokio::test]
async fn create_rejects_invalid_draft(service: Service) {
    let error = service
        .create_donor(DonorDraft {
            address: None,
            ..donor_draft("x@example.com")
        })
        .await
        .expect_err("missing address");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case::malformed("not-an-id", ErrorCode::InvalidIdentifier)]
#[case::absent("3fa85f64-5717-4562-b3fc-2c963f66afa6", ErrorCode::NotFound)]
#[tokio::test]
async fn get_reports_bad_identifiers(service: Service, #[case] id: &str, #[case] code: ErrorCode) {
    let error = service.get_donor(id).await.expect_err("lookup fails");
    assert_eq!(error.code(), code);
}

#[rstest]
#[tokio::test]
async fn eligibility_filter_uses_ninety_day_window(service: Service) {
    let cases = [
        ("never@example.com", None),
        ("boundary@example.com", Some(utc_date(2024, 3, 2))),
        ("recent@example.com", Some(utc_date(2024, 5, 1))),
    ];
    for (email, last_donation_date) in cases {
        service
            .create_donor(DonorDraft {
                last_donation_date,
                ..donor_draft(email)
            })
            .await
            .expect("create");
    }

    let eligible = service
        .list_donors(ListDonorsRequest {
            is_eligible: Some(true),
            ..ListDonorsRequest::default()
        })
        .await
        .expect("list");
    let all = service
        .list_donors(ListDonorsRequest {
            is_eligible: Some(false),
            ..ListDonorsRequest::default()
        })
        .await
        .expect("list");

    let emails: Vec<&str> = eligible
        .iter()
        .map(|donor| donor.record().email().as_ref())
        .collect();
    assert_eq!(emails, ["boundary@example.com", "never@example.com"]);
    assert_eq!(all.len(), 3);
}

#[rstest]
#[tokio::test]
async fn blood_group_lookup_is_case_insensitive(service: Service) {
    service
        .create_donor(draft("a@example.com", "A+", 30))
        .await
        .expect("create");
    service
        .create_donor(draft("b@example.com", "B+", 30))
        .await
        .expect("create");

    let matches = service.donors_by_blood_group("a+").await.expect("lookup");
    let none = service.donors_by_blood_group("O-").await.expect("lookup");

    assert_eq!(matches.len(), 1);
    assert!(none.is_empty());
}

#[rstest]
#[tokio::test]
async fn empty_blood_group_is_invalid(service: Service) {
    let error = service
        .donors_by_blood_group("  ")
        .await
        .expect_err("empty group");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn stats_average_age_per_group(service: Service) {
    for (email, group, age) in [
        ("1@example.com", "A+", 30),
        ("2@example.com", "A+", 40),
        ("3@example.com", "B-", 50),
    ] {
        service
            .create_donor(draft(email, group, age))
            .await
            .expect("create");
    }

    let stats = service.donor_stats().await.expect("stats");

    assert_eq!(stats.total, 3);
    let summary: Vec<(&str, u64, f64)> = stats
        .groups
        .iter()
        .map(|stat| (stat.blood_group.as_ref(), stat.count, stat.average_age))
        .collect();
    assert_eq!(summary, [("A+", 2, 35.0), ("B-", 1, 50.0)]);
}

#[rstest]
#[tokio::test]
async fn update_replaces_fields_and_keeps_id(service: Service) {
    let created = service
        .create_donor(draft("u@example.com", "A+", 30))
        .await
        .expect("create");

    let updated = service
        .update_donor(
            &created.id().to_string(),
            DonorPatch {
                age: Some(31),
                last_donation_date: Some(Some(utc_date(2024, 5, 1))),
                ..DonorPatch::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.record().age(), 31);
    assert!(!updated.is_eligible_at(utc_date(2024, 5, 31)));
}

#[rstest]
#[tokio::test]
async fn update_to_taken_email_is_duplicate(service: Service) {
    service
        .create_donor(draft("first@example.com", "A+", 30))
        .await
        .expect("create");
    let second = service
        .create_donor(draft("second@example.com", "A+", 30))
        .await
        .expect("create");

    let error = service
        .update_donor(
            &second.id().to_string(),
            DonorPatch {
                email: Some("FIRST@example.com".to_owned()),
                ..DonorPatch::default()
            },
        )
        .await
        .expect_err("email taken");

    assert_eq!(error.code(), ErrorCode::DuplicateEmail);
}

#[rstest]
#[tokio::test]
async fn delete_returns_record_then_not_found(service: Service) {
    let created = service
        .create_donor(draft("d@example.com", "A+", 30))
        .await
        .expect("create");
    let id = created.id().to_string();

    let deleted = service.delete_donor(&id).await.expect("delete");
    let again = service.delete_donor(&id).await.expect_err("already gone");

    assert_eq!(deleted.id(), created.id());
    assert_eq!(again.code(), ErrorCode::NotFound);
}

#[rstest]
#[case::connection(DonorRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case::query(DonorRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn repository_errors_map_to_domain_codes(
    #[case] failure: DonorRepositoryError,
    #[case] code: ErrorCode,
) {
    let mut repo = MockDonorRepository::new();
    repo.expect_find().times(1).return_once(move |_| Err(failure));
    let service = DonorService::new(Arc::new(repo), fixture_clock());

    let error = service
        .list_donors(ListDonorsRequest::default())
        .await
        .expect_err("repository failure");

    assert_eq!(error.code(), code);
}

#[tokio::test]
async fn stats_propagate_store_results() {
    let mut repo = MockDonorRepository::new();
    repo.expect_blood_group_stats().times(1).return_once(|| {
        Ok(vec![BloodGroupStat {
            blood_group: BloodGroup::new("O+").expect("valid group"),
            count: 4,
            average_age: 27.5,
        }])
    });
    repo.expect_count_all().times(1).return_once(|| Ok(4));
    let service = DonorService::new(Arc::new(repo), fixture_clock());

    let stats = service.donor_stats().await.expect("stats");

    assert_eq!(stats.total, 4);
    assert_eq!(stats.groups.len(), 1);
}
