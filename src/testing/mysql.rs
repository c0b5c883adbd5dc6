//! MySQL connection settings for integration tests.

/// Environment variable holding the test database URL.
pub const MYSQL_TEST_URL: &str = "MYSQL_TEST_URL";

/// Test database URL, or `None` when MySQL tests should be skipped.
pub fn mysql_test_url() -> Option<String> {
    std::env::var(MYSQL_TEST_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
}
