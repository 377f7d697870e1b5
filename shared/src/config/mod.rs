//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `environment` - Environment detection
//! - `logging` - Log level and format
//! - `verification` - One-time-code flow timings and formats
//! - `provider` - Phone-auth provider selection and credentials
//! - `payment` - Platform fee settings

pub mod environment;
pub mod logging;
pub mod payment;
pub mod provider;
pub mod verification;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use environment::Environment;
pub use logging::{LogFormat, LoggingConfig};
pub use payment::PaymentConfig;
pub use provider::{ProviderConfig, ProviderKind};
pub use verification::VerificationConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Verification flow configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Phone-auth provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Platform fee configuration
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Whether the signup flow offers second-factor enrollment
    #[serde(default = "default_offer_mfa")]
    pub offer_mfa: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            verification: VerificationConfig::default(),
            provider: ProviderConfig::default(),
            payment: PaymentConfig::default(),
            offer_mfa: default_offer_mfa(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            provider: ProviderConfig::mock(),
            logging: LoggingConfig::for_environment(Environment::Development),
            ..Default::default()
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            provider: ProviderConfig {
                kind: ProviderKind::IdentityToolkit,
                ..Default::default()
            },
            logging: LoggingConfig::for_environment(Environment::Production),
            ..Default::default()
        }
    }

    /// Baseline configuration for an environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::development();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }
}

fn default_offer_mfa() -> bool {
    true
}
