//! Tracing setup for this server: console output is always on; a rolling
//! file sink is layered in when `LoggingConfig::enable_file_logging` is set.
//! The level directive comes from config if present, else `RUST_LOG`, else
//! "info".

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync + 'static>;

/// Install the global subscriber. Safe to call more than once per process —
/// `try_init` swallows the "already set" error rather than panicking.
pub fn init_with_config(cfg: &LoggingConfig) {
    let env_filter = cfg
        .level
        .as_deref()
        .map(tracing_subscriber::EnvFilter::new)
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(cfg.format)];
    if let Some(layer) = file_layer(cfg) {
        layers.push(layer);
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
            .boxed(),
    }
}

/// `None` if file logging is off, or the log directory can't be created —
/// in the latter case we fall back to console-only rather than failing
/// startup over a logging sink.
fn file_layer(cfg: &LoggingConfig) -> Option<BoxedLayer> {
    if !cfg.enable_file_logging {
        return None;
    }
    if std::fs::create_dir_all(&cfg.dir).is_err() {
        eprintln!(
            "failed to create log directory '{}', continuing with stdout only",
            cfg.dir
        );
        return None;
    }

    let rotation = match cfg.rotation.to_lowercase().as_str() {
        "hourly" => tracing_appender::rolling::Rotation::HOURLY,
        "never" => tracing_appender::rolling::Rotation::NEVER,
        _ => tracing_appender::rolling::Rotation::DAILY,
    };
    let appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, &cfg.dir, &cfg.filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    // Leaked for the process lifetime: dropping it would stop flushing the
    // non-blocking writer, and nothing else owns it after this function returns.
    Box::leak(Box::new(guard));

    Some(match cfg.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(non_blocking)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(non_blocking)
            .boxed(),
    })
}
