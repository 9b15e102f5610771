//! Common test utilities for integration tests
//!
//! Shared fixtures used across multiple integration test files.

#![allow(dead_code)]

use barback::domain::models::{Config, RetryConfig};
use barback::{ConfigLoader, ConnectionConfig, PostgrestClient, Privilege, Record};
use serde_json::Value;

pub const PUBLIC_KEY: &str = "test-public-key";
pub const SERVICE_KEY: &str = "test-service-key";

/// Object literal as a record.
pub fn row(value: Value) -> Record {
    value
        .as_object()
        .cloned()
        .expect("test row must be a JSON object")
}

/// Configuration pointing at `endpoint` with both keys and fast retries.
pub fn backend_config(endpoint: &str) -> Config {
    let mut config = Config::default();
    config.backend.endpoint_url = Some(endpoint.to_string());
    config.backend.public_key = Some(PUBLIC_KEY.to_string());
    config.backend.service_key = Some(SERVICE_KEY.to_string());
    config.backend.timeout_secs = 5;
    config.retry = RetryConfig {
        max_retries: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    };
    config
}

pub fn connection(config: &Config, privilege: Privilege) -> ConnectionConfig {
    ConfigLoader::resolve_connection(config, privilege).expect("connection should resolve")
}

/// Client for `endpoint` holding the key for `privilege`.
pub fn client(endpoint: &str, privilege: Privilege) -> PostgrestClient {
    let config = backend_config(endpoint);
    PostgrestClient::new(&connection(&config, privilege), &config)
        .expect("Failed to create client")
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
