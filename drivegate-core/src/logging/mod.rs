//! Logging setup
//!
//! Everything logs through the standard `log` macros with a
//! `drivegate::<component>` target. [`init_logging`] installs an
//! `env_logger` backend once per process; `RUST_LOG` still takes
//! precedence over the configured level.
//!
//! # Example
//!
//! ```rust,no_run
//! use drivegate_core::config::LoggingConfig;
//!
//! drivegate_core::logging::init_logging(&LoggingConfig::default());
//! log::info!(target: "drivegate::cli", "serving on port {}", 8080);
//! ```

use crate::config::LoggingConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the global logger. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let json = config.is_json();
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.level_filter());
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        builder.format(move |buf, record| {
            let line = if json {
                format_json(Utc::now(), record)
            } else {
                format_text(Utc::now(), record)
            };
            writeln!(buf, "{}", line)
        });
        if let Err(err) = builder.try_init() {
            eprintln!("logger already installed: {}", err);
        }
    });
}

/// One JSON object per line
pub fn format_json(timestamp: DateTime<Utc>, record: &log::Record<'_>) -> String {
    let mut json = serde_json::Map::new();
    json.insert(
        "timestamp".to_string(),
        serde_json::Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    json.insert("level".to_string(), serde_json::Value::String(record.level().to_string()));
    json.insert("target".to_string(), serde_json::Value::String(record.target().to_string()));
    json.insert("message".to_string(), serde_json::Value::String(record.args().to_string()));

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

/// `2024-01-15 10:30:00.000 INFO  [drivegate::serve] message`
pub fn format_text(timestamp: DateTime<Utc>, record: &log::Record<'_>) -> String {
    format!(
        "{} {:5} [{}] {}",
        timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.target(),
        record.args()
    )
}
