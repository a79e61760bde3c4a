//! Tracing bootstrap shared by both service binaries.

use std::env;
use std::sync::Once;

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

static INIT_TRACING: Once = Once::new();

/// Output format for the tracing subscriber, selectable on the CLI.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
    Pretty,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init_tracing(format: LogFormat, default_level: &str) {
    let default_level = default_level.to_string();
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(&default_level)),
            )
            .with_timer(ChronoLocal::rfc_3339());

        match format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// Default log level, lowered when running under integration tests.
pub fn default_level() -> &'static str {
    if env::var("SITEBRIDGE_INTEGRATION_TEST").is_ok() {
        "error"
    } else {
        "info"
    }
}
