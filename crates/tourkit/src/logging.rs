#![forbid(unsafe_code)]

//! Subscriber setup for hosts and the demo binary.
//!
//! The engine crates only emit `tracing` events; installing a subscriber is
//! the host's decision. `init_logging` covers the common case of formatted
//! output filtered by `RUST_LOG` (or the given directive when it is unset).
//!
//! Useful directives:
//! - `tourkit_runtime=debug` shows phase transitions and recompute spans.
//! - `tourkit_runtime::locator=trace` shows every tier tried per attempt.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor an explicit directive is given.
pub const DEFAULT_FILTER: &str = "tourkit=info,tourkit_runtime=info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    #[cfg(feature = "logging-json")]
    Json,
}

/// Build the filter: `RUST_LOG` wins, then `directive`, then [`DEFAULT_FILTER`].
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global fmt subscriber writing to stderr.
///
/// Returns `false` when a global subscriber was already installed, which is
/// not an error for embedders that set up their own.
pub fn init_logging(directive: Option<&str>) -> bool {
    init_logging_with(directive, LogFormat::default())
}

/// Like [`init_logging`] with an explicit output format.
pub fn init_logging_with(directive: Option<&str>, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .with_writer(std::io::stderr)
        .with_target(true);
    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        #[cfg(feature = "logging-json")]
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
