use super::defaults;
use std::net::SocketAddr;

/// Server-wide tunables. Mirrors the teacher's flat `ServerConfig` struct:
/// one place holding every timeout/limit, constructed with sensible
/// defaults and overridable by `config::load`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub default_main_time_ms: i64,
    pub default_bid_duration_ms: i64,
    pub default_choice_duration_ms: i64,
    pub start_confirm_timeout_ms: i64,
    pub rematch_window_ms: i64,
    pub rematch_window_insufficient_material_ms: i64,
    pub disconnect_timeout_ms: i64,
    pub disconnect_silence_ms: i64,
    pub room_stale_timeout_ms: i64,
    pub start_expired_retention_ms: i64,
    pub queue_stale_timeout_ms: i64,
    pub supported_time_controls_ms: Vec<i64>,
    pub cleanup_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().expect("valid default bind addr"),
            default_main_time_ms: defaults::DEFAULT_MAIN_TIME_MS,
            default_bid_duration_ms: defaults::DEFAULT_BID_DURATION_MS,
            default_choice_duration_ms: defaults::DEFAULT_CHOICE_DURATION_MS,
            start_confirm_timeout_ms: defaults::DEFAULT_START_CONFIRM_TIMEOUT_MS,
            rematch_window_ms: defaults::DEFAULT_REMATCH_WINDOW_MS,
            rematch_window_insufficient_material_ms:
                defaults::DEFAULT_REMATCH_WINDOW_INSUFFICIENT_MATERIAL_MS,
            disconnect_timeout_ms: defaults::DEFAULT_DISCONNECT_TIMEOUT_MS,
            disconnect_silence_ms: defaults::DEFAULT_DISCONNECT_SILENCE_MS,
            room_stale_timeout_ms: defaults::ROOM_STALE_TIMEOUT_MS,
            start_expired_retention_ms: defaults::START_EXPIRED_RETENTION_MS,
            queue_stale_timeout_ms: defaults::QUEUE_STALE_TIMEOUT_MS,
            supported_time_controls_ms: defaults::SUPPORTED_TIME_CONTROLS_MS.to_vec(),
            cleanup_interval_ms: defaults::CLEANUP_INTERVAL_MS,
        }
    }
}
