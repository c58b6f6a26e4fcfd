//! Shared helper utilities for backend integration tests.

/// Environment variable naming a disposable PostgreSQL database for the
/// Diesel adapter suites.
pub const TEST_DATABASE_URL_VAR: &str = "DONOR_REGISTRY_TEST_DATABASE_URL";

/// Returns true when the `SKIP_TEST_CLUSTER` environment variable is set to a
/// truthy value.
///
/// Truthy values: "1", "true", "yes" (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Resolve the test database URL.
///
/// Without one, prints a skip marker and returns `None` when
/// `SKIP_TEST_CLUSTER` is truthy, and panics otherwise so CI breakage is not
/// masked.
pub fn test_database_url() -> Option<String> {
    match std::env::var(TEST_DATABASE_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ if should_skip_test_cluster() => {
            eprintln!("SKIP-TEST-CLUSTER: {TEST_DATABASE_URL_VAR} is not set");
            None
        }
        _ => panic!(
            "{TEST_DATABASE_URL_VAR} is not set. Point it at a disposable database or set \
             SKIP_TEST_CLUSTER=1 to skip."
        ),
    }
}

