//! Shared utilities and common types for the Onboard workspace
//!
//! This crate provides common functionality used across all modules:
//! - Configuration types
//! - Utility functions (phone handling, field validation)

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, Environment, LogFormat, LoggingConfig, PaymentConfig, ProviderConfig,
    ProviderKind, VerificationConfig,
};
pub use utils::{phone, validation};
