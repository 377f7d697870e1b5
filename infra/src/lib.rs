//! # Infrastructure Layer
//!
//! Concrete implementations of the provider seams declared in `ob_core`:
//!
//! - **Auth**: in-memory mock provider, Identity Toolkit REST provider,
//!   profile store and the factory that picks one from configuration
//! - **KYC**: Aadhaar document extraction
//! - **Payment**: platform fee gateway
//! - **Config**: layered configuration loading (files, `.env`, `OB__*` variables)

// Re-export core types for convenience
pub use ob_core::errors::*;

/// Phone-auth, second-factor and profile providers
pub mod auth;

/// Layered configuration loading
pub mod config;

/// Aadhaar document extraction
pub mod kyc;

/// Platform fee payment gateway
pub mod payment;

pub use auth::{
    create_phone_auth_provider, AuthProviders, IdentityToolkitProvider, InMemoryProfileStore,
    MockPhoneAuthProvider,
};
pub use config::{load_config, load_config_from, load_env_files};
pub use kyc::StaticAadhaarExtractor;
pub use payment::MockPaymentGateway;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration source or deserialization error
    #[error("Configuration error: {0}")]
    Settings(#[from] ::config::ConfigError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The selected provider needs an API key
    #[error("Configuration error: an API key is required for the {0} provider")]
    MissingApiKey(&'static str),
}
