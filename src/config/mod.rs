//! Configuration module.
//!
//! Mirrors the teacher's split: one `Config` root, sub-configs per concern,
//! defaults named in [`defaults`], and a `load()` that layers a `config.json`
//! file and `BIDCHESS_*` environment variables over the defaults.

pub mod defaults;
pub mod logging;
pub mod server;

pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Load configuration: defaults, overlaid by `config.json` in the working
/// directory if present, overlaid by a handful of `BIDCHESS_*` env vars.
pub fn load() -> Config {
    let mut cfg = match std::fs::read_to_string("config.json") {
        Ok(contents) => match serde_json::from_str::<Config>(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("Failed to parse config.json, using defaults: {e}");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    };

    if let Ok(addr) = std::env::var("BIDCHESS_BIND_ADDR") {
        match addr.parse() {
            Ok(parsed) => cfg.server.bind_addr = parsed,
            Err(e) => eprintln!("Invalid BIDCHESS_BIND_ADDR '{addr}': {e}"),
        }
    }
    if let Ok(level) = std::env::var("RUST_LOG") {
        cfg.logging.level.get_or_insert(level);
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.server.default_main_time_ms, 300_000);
        assert_eq!(cfg.server.disconnect_timeout_ms, 45_000);
        assert_eq!(cfg.server.disconnect_silence_ms, 10_000);
        assert_eq!(cfg.server.supported_time_controls_ms, vec![300_000, 600_000, 900_000]);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.default_bid_duration_ms, cfg.server.default_bid_duration_ms);
    }
}
