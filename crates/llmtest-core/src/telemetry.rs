//! Tracing initialisation for llmtest binaries and test hosts.
//!
//! Call [`init_tracing`] once at startup. Later calls are ignored because
//! the global subscriber can only be installed once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, writing to stderr.
///
/// * `json`: emit one JSON object per line instead of the human format.
/// * `level`: default verbosity when `RUST_LOG` is unset. `RUST_LOG`
///   always wins when present.
///
/// Report lines go to stdout, so logs never interleave with them.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();
    }
}
