//! Logging initialization for the `tessera` binary
//!
//! Human-readable or JSON events on stderr, so command output on stdout
//! stays machine-readable. `RUST_LOG` overrides the level from the flags.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events the default filter lets through
const CRATES: &[&str] = &[
    "tessera",
    "tessera_schema",
    "tessera_models",
    "tessera_validator",
    "tessera_format",
];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

pub fn init_logging(config: &LoggingConfig) {
    let subscriber = tracing_subscriber::registry().with(build_env_filter(config));

    if config.json {
        let console_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr);
        subscriber.with(console_layer).init();
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr);
        subscriber.with(console_layer).init();
    }

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)))
}

fn default_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("tessera=debug,"));
        assert!(directives.contains("tessera_format=debug"));
        assert_eq!(directives.split(',').count(), CRATES.len());
    }
}
