//! Tracing subscriber setup.

use shezhen_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, then the configured level, then `info`.
#[must_use]
pub fn env_filter(config: &GeneralConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns `false` if one was already set,
/// which makes repeated calls harmless.
pub fn init_tracing(config: &GeneralConfig) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));
    let installed = if config.json_logs {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };
    if installed {
        tracing::debug!(level = %config.log_level, json = config.json_logs, "tracing initialised");
    }
    installed
}
