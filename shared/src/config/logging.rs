//! Log output settings consumed by the binary's subscriber setup

use serde::{Deserialize, Serialize};

use super::Environment;

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level (`info`) or a full filter directive (`info,ob_core=debug`);
    /// `RUST_LOG` takes precedence when set
    pub level: String,
    pub format: LogFormat,
    /// ANSI colors; ignored by the JSON format
    pub colored: bool,
    /// File and line of each event
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: LogFormat::default(),
            colored: true,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: String::from("debug"),
                source_location: true,
                ..Self::default()
            },
            Environment::Staging => Self::json("info"),
            Environment::Production => Self::json("warn"),
        }
    }

    fn json(level: &str) -> Self {
        Self {
            level: level.to_string(),
            format: LogFormat::Json,
            colored: false,
            source_location: false,
        }
    }
}
