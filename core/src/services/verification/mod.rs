//! Phone verification: code request, resend cooldown and code submission
//!
//! This module provides the verification workflow shared by primary sign-in
//! and second-factor enrollment:
//! - Provider seams (`PhoneAuthProvider`, `MultiFactorProvider`, `ProfileService`)
//! - `ChallengeChannel` implementations for both flows
//! - `VerificationSession`, which owns the challenge, the cooldown countdown
//!   and the code entry buffer

mod channel;
mod service;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use channel::{EnrollmentChannel, PhoneSignInChannel, DEFAULT_FACTOR_DISPLAY_NAME};
pub use service::VerificationSession;
pub use traits::{ChallengeChannel, MultiFactorProvider, PhoneAuthProvider, ProfileService};
pub use types::{CodeInput, ResendOutcome, Verified};
