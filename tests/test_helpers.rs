use std::sync::Arc;

use bidchess_server::config::ServerConfig;
use bidchess_server::router::Router;
use bidchess_server::server::build_app;

/// A server config tuned for fast, deterministic integration tests: short
/// timeouts so lazy-driver behavior (expiry, disconnect) doesn't require
/// sleeping for the production-sized windows.
#[allow(dead_code)]
pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        default_main_time_ms: 60_000,
        default_bid_duration_ms: 10_000,
        default_choice_duration_ms: 10_000,
        start_confirm_timeout_ms: 5_000,
        rematch_window_ms: 10_000,
        rematch_window_insufficient_material_ms: 10_000,
        disconnect_timeout_ms: 5_000,
        disconnect_silence_ms: 2_000,
        room_stale_timeout_ms: 60_000,
        start_expired_retention_ms: 5_000,
        queue_stale_timeout_ms: 30_000,
        supported_time_controls_ms: vec![300_000, 600_000, 900_000],
        cleanup_interval_ms: 200,
    }
}

#[allow(dead_code)]
pub fn test_server() -> axum_test::TestServer {
    let router = Router::new(Arc::new(test_server_config()));
    let app = build_app(router);
    axum_test::TestServer::new(app).expect("test server should start")
}
