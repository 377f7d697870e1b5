//! Error types surfaced by the verification, signup, KYC and payment services.

mod types;

#[cfg(test)]
mod tests;

pub use types::{
    ErrorNotice, KycError, PaymentError, ProviderError, ProviderErrorCode, RecoveryAction,
    SignupError, VerificationError,
};
