//! Runs in its own process because `init_logging` installs the global
//! tracing subscriber.

use apifox_capture::observability::init_logging;
use apifox_capture::ObservabilityConfig;

#[test]
fn test_init_logging_is_idempotent() {
    let config = ObservabilityConfig::default();
    assert!(init_logging(&config).is_ok());
    assert!(init_logging(&config).is_ok());
}
