#![allow(dead_code)]

pub mod mock_server;

use modelrelay_core::config::{HttpConfig, RelayConfig};
use modelrelay_core::http::HttpClient;

pub fn client() -> HttpClient {
    HttpClient::new(HttpConfig {
        connect_timeout_secs: 5,
        low_speed_time_secs: 10,
        ..HttpConfig::default()
    })
}

/// Config with both services pointed at `base` and the local host accepted
/// as a model page host.
pub fn config_for(base: &str) -> RelayConfig {
    let mut cfg = RelayConfig::default();
    cfg.source.api_base = format!("{}/api/v1", base);
    cfg.source.page_hosts = vec!["127.0.0.1".to_string()];
    cfg.target.endpoint = base.to_string();
    cfg
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}
