//! Logging setup.
//!
//! Development builds log human-readable lines at `debug`; production logs
//! JSON at `info`. `RUST_LOG` always wins over the default level.

use crate::config::Environment;
use tracing_subscriber::EnvFilter;

fn default_filter(env: Environment) -> &'static str {
    match env {
        Environment::Development => "debug",
        Environment::Production => "info",
    }
}

pub fn init(env: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(env)));

    match env {
        Environment::Development => tracing_subscriber::fmt().with_env_filter(filter).init(),
        Environment::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init(),
    }
}
