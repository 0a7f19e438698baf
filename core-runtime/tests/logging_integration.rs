//! Integration tests for logging system

use core_runtime::config::ServerConfig;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LogLevel};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once_per_process() {
    // A global subscriber can only be installed once, so both halves live in
    // one test.
    let config = ServerConfig::from_lookup(|key| match key {
        "WARBLER_LOG_FORMAT" => Some("compact".to_string()),
        "WARBLER_LOG_LEVEL" => Some("debug".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert_eq!(config.logging.level, LogLevel::Debug);

    init_logging(config.logging.clone()).unwrap();
    tracing::info!(library = %strip_path("/home/test/Music"), "logging ready");

    let second = init_logging(config.logging);
    assert!(matches!(second, Err(Error::Config(_))));
}
