//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults for the detected [`Environment`]
//! 2. `onboard.toml`
//! 3. The environment-specific file (`onboard.development.toml`, ...)
//! 4. `OB__`-prefixed variables, `__` separating nesting levels
//!    (`OB__PROVIDER__API_KEY`, `OB__VERIFICATION__RESEND_COOLDOWN_SECS`)
//!
//! `.env` files are read into the process environment before any of that.

use std::path::Path;

use ob_shared::{AppConfig, Environment};

use crate::InfrastructureError;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "OB";

/// Base configuration file name, without extension
pub const BASE_CONFIG_FILE: &str = "onboard";

/// Read `.env` and the environment-specific `.env.<environment>` into the
/// process environment, returning the detected [`Environment`]
pub fn load_env_files() -> Environment {
    // The generic file may set ENVIRONMENT, so it is read first
    dotenvy::dotenv().ok();
    let environment = Environment::from_env();
    if dotenvy::from_filename(environment.env_file()).is_ok() {
        tracing::debug!(file = %environment.env_file(), "Loaded environment file");
    }
    Environment::from_env()
}

/// Load configuration from the working directory and the process environment
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    let environment = load_env_files();
    load_config_from(environment, Path::new("."))
}

/// Load configuration for `environment`, reading files from `dir`
pub fn load_config_from(environment: Environment, dir: &Path) -> Result<AppConfig, InfrastructureError> {
    let defaults = AppConfig::for_environment(environment);

    let settings = ::config::Config::builder()
        .add_source(::config::Config::try_from(&defaults)?)
        .add_source(::config::File::from(dir.join(BASE_CONFIG_FILE)).required(false))
        .add_source(::config::File::from(dir.join(environment.config_file())).required(false))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    validate(&config)?;

    tracing::info!(
        environment = %config.environment,
        provider = ?config.provider.kind,
        offer_mfa = config.offer_mfa,
        "Configuration loaded"
    );
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), InfrastructureError> {
    let verification = &config.verification;
    if verification.code_length == 0 {
        return Err(InfrastructureError::Config(
            "verification.code_length must be at least 1".to_string(),
        ));
    }
    if !verification.country_code.starts_with('+') {
        return Err(InfrastructureError::Config(
            "verification.country_code must start with '+'".to_string(),
        ));
    }
    if verification.request_timeout_secs == 0 {
        return Err(InfrastructureError::Config(
            "verification.request_timeout_secs must be positive".to_string(),
        ));
    }
    Ok(())
}
