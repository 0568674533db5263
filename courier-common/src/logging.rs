use std::{fs::OpenOptions, path::Path, str::FromStr, sync::Mutex};

use tracing::{Metadata, metadata::LevelFilter};
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:expr),*) => {{
        let span = $crate::tracing::span!($level, $span);
        let _enter = span.enter();

        $crate::tracing::event!($level, $($msg),*)
    }};
}

/// Traffic handed to a transport: message construction and send attempts.
#[macro_export]
macro_rules! outgoing {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "outgoing", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::outgoing!(level = TRACE, $($msg),*)
    };
}

/// Bookkeeping inside the dispatcher: phase changes, state loading, rotation.
#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "internal", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::internal!(level = TRACE, $($msg),*)
    };
}

fn is_courier(metadata: &Metadata<'_>) -> bool {
    metadata.target().starts_with("courier")
}

/// Resolve the level filter from `LOG_LEVEL`, falling back to `TRACE` in debug
/// builds and `INFO` in release builds.
#[must_use]
pub fn level_from_env() -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    std::env::var("LOG_LEVEL").map_or(default, |level| parse_level(&level, default))
}

fn parse_level(level: &str, default: LevelFilter) -> LevelFilter {
    LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level specified {level}, defaulting to {default}");
        default
    })
}

/// Install the global subscriber.
///
/// Console output is always enabled. When `log_file` is given, events are
/// additionally appended to that file without ANSI colouring.
///
/// # Errors
/// If the log file cannot be opened for appending.
pub fn init(log_file: Option<&Path>) -> std::io::Result<()> {
    let level = level_from_env();

    let file = log_file
        .map(|path| OpenOptions::new().create(true).append(true).open(path))
        .transpose()?;

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(is_courier)),
        )
        .with(file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(Mutex::new(file))
                .with_filter(level)
                .with_filter(FilterFn::new(is_courier))
        }))
        .init();

    Ok(())
}
