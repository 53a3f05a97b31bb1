// Logging tests
//
// Only one global subscriber can exist per process, so initialization is
// checked for idempotence rather than for output.

use containerservice_testing::config::LoggingConfig;
use containerservice_testing::logging::{init_subscriber, init_test_subscriber};

#[test]
fn test_can_initialize_tracing_subscriber_more_than_once() {
    init_test_subscriber();
    init_test_subscriber();

    tracing::info!(component = "logging_tests", "Subscriber initialized");
}

#[test]
fn test_second_global_init_is_reported() {
    init_test_subscriber();

    let result = init_subscriber(&LoggingConfig::default());

    assert!(result.is_err());
}

#[test]
fn test_structured_fields_accepted_by_all_levels() {
    init_test_subscriber();

    let controller = "widgets";
    tracing::trace!(controller, "trace");
    tracing::debug!(controller, cases = 4, "debug");
    tracing::info!(controller, passed = 4, failed = 0, "info");
    tracing::warn!(controller = %controller, "warn");
    tracing::error!(error = "boom", "error");
}
