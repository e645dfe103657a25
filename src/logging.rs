//! Tracing subscriber setup for the demo host.

use crate::cli::LogLevel;
use tracing::Level;

fn max_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// Install the global fmt subscriber.
///
/// Explicit `-q` / `-v` flags pin the maximum level. Without them `RUST_LOG` decides,
/// defaulting to INFO.
pub fn configure_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    let builder = tracing_subscriber::fmt();
    if level == LogLevel::Info {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();
        builder.with_env_filter(filter).init();
    } else {
        builder.with_max_level(max_level(level)).init();
    }
}
