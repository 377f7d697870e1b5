//! Tracing subscriber setup

use ob_shared::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        return String::from("debug");
    }
    match config.level.trim() {
        "" => String::from("info"),
        level => level.to_string(),
    }
}

/// Install the global subscriber; logs go to stderr so prompts stay readable
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config, verbose)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(config.colored)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(config.colored)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_shared::Environment;

    #[test]
    fn test_default_directive() {
        let config = LoggingConfig::for_environment(Environment::Production);
        assert_eq!(default_directive(&config, false), "warn");
        assert_eq!(default_directive(&config, true), "debug");

        let config = LoggingConfig {
            level: String::from("info,ob_core=trace"),
            ..LoggingConfig::default()
        };
        assert_eq!(default_directive(&config, false), "info,ob_core=trace");
    }
}
