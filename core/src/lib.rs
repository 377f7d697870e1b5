//! # Onboard Core
//!
//! Core domain layer for the Onboard signup flow.
//! This crate contains the domain entities, the phone verification services
//! (countdown timer, verification session, second-factor enrollment), the
//! signup state machine, the KYC and platform fee services, provider traits,
//! and the error types surfaced to the user.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    AadhaarRecord, AadhaarUpload, AuthenticatedIdentity, Challenge, ChallengeId, MfaStatus,
    PaymentMethod, PhoneNumber, ProfileForm, SignupCompletion, SignupEvent, SignupState,
    SignupStep,
};
pub use errors::{ErrorNotice, RecoveryAction, SignupError, VerificationError};
pub use services::{
    MultiFactorProvider, PhoneAuthProvider, ProfileService, ResendOutcome, SignupStateMachine,
};
