//! Signup flow states and the notifications the flow emits.

use serde::Serialize;
use std::fmt;

use super::challenge::Challenge;
use super::identity::EnrolledFactor;
use super::phone_number::PhoneNumber;

/// Active step of the signup flow, with the data that only exists during it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupState {
    PhoneInput,
    OtpVerification { challenge: Challenge },
    UserDetails { verified_phone: PhoneNumber },
    MfaSetup { enrollment_challenge: Option<Challenge> },
    Completed { completion: SignupCompletion },
}

impl SignupState {
    pub fn step(&self) -> SignupStep {
        match self {
            Self::PhoneInput => SignupStep::PhoneInput,
            Self::OtpVerification { .. } => SignupStep::OtpVerification,
            Self::UserDetails { .. } => SignupStep::UserDetails,
            Self::MfaSetup { .. } => SignupStep::MfaSetup,
            Self::Completed { .. } => SignupStep::Completed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Step kind without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignupStep {
    PhoneInput,
    OtpVerification,
    UserDetails,
    MfaSetup,
    Completed,
}

impl SignupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhoneInput => "phone input",
            Self::OtpVerification => "OTP verification",
            Self::UserDetails => "user details",
            Self::MfaSetup => "two-factor setup",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SignupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the optional second-factor step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MfaStatus {
    NotOffered,
    Skipped,
    Enrolled { factor: EnrolledFactor },
}

/// Result of a finished signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupCompletion {
    pub verified_phone: PhoneNumber,
    pub identity_uid: String,
    pub mfa: MfaStatus,
}

/// Notification broadcast by the signup state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupEvent {
    StepChanged { from: SignupStep, to: SignupStep },
    Completed(SignupCompletion),
}
