//! Error types for phone verification, signup, KYC and payment operations
//!
//! Every error that can reach the user converts into an [`ErrorNotice`]: a
//! stable code for programmatic handling, the message to display, and the
//! recovery action the surface should offer.

use ob_shared::validation::ValidationErrors;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::signup::SignupStep;

/// Failure classes reported by the external phone-auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderErrorCode {
    InvalidPhoneNumber,
    QuotaExceeded,
    TooManyRequests,
    MissingVerificationCode,
    CaptchaCheckFailed,
    InvalidVerificationCode,
    SessionExpired,
    /// The provider no longer knows the challenge the code was sent for
    InvalidSession,
    NotAuthenticated,
    /// Network failure, timeout or 5xx from the provider
    Unavailable,
    Unknown(String),
}

impl ProviderErrorCode {
    /// Parse a provider code in either the SDK form (`auth/invalid-verification-code`)
    /// or the REST form (`INVALID_CODE`, optionally followed by ` : detail`)
    pub fn parse(raw: &str) -> Self {
        let code = raw.split(':').next().unwrap_or(raw).trim();
        let code = code.strip_prefix("auth/").unwrap_or(code);
        match code {
            "invalid-phone-number" | "INVALID_PHONE_NUMBER" => Self::InvalidPhoneNumber,
            "quota-exceeded" | "QUOTA_EXCEEDED" => Self::QuotaExceeded,
            "too-many-requests" | "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "missing-verification-code" | "MISSING_CODE" => Self::MissingVerificationCode,
            "captcha-check-failed" | "CAPTCHA_CHECK_FAILED" => Self::CaptchaCheckFailed,
            "invalid-verification-code" | "INVALID_CODE" => Self::InvalidVerificationCode,
            "session-expired" | "SESSION_EXPIRED" | "CODE_EXPIRED" => Self::SessionExpired,
            "invalid-verification-id" | "missing-verification-id" | "INVALID_SESSION_INFO"
            | "MISSING_SESSION_INFO" => Self::InvalidSession,
            "user-token-expired" | "requires-recent-login" | "INVALID_ID_TOKEN"
            | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
                Self::NotAuthenticated
            }
            "network-request-failed" | "UNAVAILABLE" | "INTERNAL_ERROR" => Self::Unavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical kebab-case name of the code
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidPhoneNumber => "invalid-phone-number",
            Self::QuotaExceeded => "quota-exceeded",
            Self::TooManyRequests => "too-many-requests",
            Self::MissingVerificationCode => "missing-verification-code",
            Self::CaptchaCheckFailed => "captcha-check-failed",
            Self::InvalidVerificationCode => "invalid-verification-code",
            Self::SessionExpired => "session-expired",
            Self::InvalidSession => "invalid-verification-id",
            Self::NotAuthenticated => "user-token-expired",
            Self::Unavailable => "network-request-failed",
            Self::Unknown(code) => code.as_str(),
        }
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Build from a raw provider code string
    pub fn from_code(raw: &str) -> Self {
        Self::new(ProviderErrorCode::parse(raw), raw)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Unavailable, message)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ProviderErrorCode::NotAuthenticated, "User not authenticated")
    }
}

/// What the user can do about an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Correct the input and submit again
    FixInput,
    /// Tap the same button again
    RetryNow,
    /// Wait for the resend countdown before asking for another code
    WaitForCooldown,
    /// Ask for a fresh code
    RequestNewCode,
    /// Enter a different phone number
    ChangeNumber,
    /// The primary session is gone; sign in again
    SignInAgain,
}

/// Errors surfaced by a verification session (primary sign-in or MFA enrollment)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Please enter a valid 10-digit mobile number.")]
    InvalidPhoneNumber,

    #[error("Please enter a valid 6-digit OTP.")]
    MalformedCode,

    #[error("SMS quota exceeded. Please try again later.")]
    QuotaExceeded,

    #[error("Too many requests. Please wait a moment before trying again.")]
    RateLimited,

    #[error("Captcha verification failed. Please try again.")]
    CaptchaFailed,

    #[error("Verification service is unavailable. Please try again later.")]
    ProviderUnavailable,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("The verification code has expired. Please request a new code.")]
    ChallengeExpired,

    #[error("No active verification. Please request a new code.")]
    NoActiveChallenge,

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Two-factor authentication is already set up.")]
    AlreadyEnrolled,

    #[error("A request is already in progress.")]
    Busy,

    /// The result belonged to a challenge that a newer request replaced
    #[error("This code was replaced by a newer one.")]
    Superseded,

    #[error("Something went wrong. Please try again.")]
    Unexpected { detail: String },
}

impl VerificationError {
    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            Self::MalformedCode => "MALFORMED_CODE",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::RateLimited => "RATE_LIMITED",
            Self::CaptchaFailed => "CAPTCHA_FAILED",
            Self::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            Self::InvalidCode => "INVALID_CODE",
            Self::ChallengeExpired => "CHALLENGE_EXPIRED",
            Self::NoActiveChallenge => "NO_ACTIVE_CHALLENGE",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::AlreadyEnrolled => "ALREADY_ENROLLED",
            Self::Busy => "BUSY",
            Self::Superseded => "SUPERSEDED",
            Self::Unexpected { .. } => "UNEXPECTED",
        }
    }

    pub fn recovery(&self) -> RecoveryAction {
        match self {
            Self::InvalidPhoneNumber => RecoveryAction::ChangeNumber,
            Self::MalformedCode => RecoveryAction::FixInput,
            Self::QuotaExceeded | Self::RateLimited => RecoveryAction::WaitForCooldown,
            Self::ChallengeExpired | Self::NoActiveChallenge | Self::Superseded => {
                RecoveryAction::RequestNewCode
            }
            Self::NotAuthenticated => RecoveryAction::SignInAgain,
            Self::CaptchaFailed
            | Self::ProviderUnavailable
            | Self::InvalidCode
            | Self::AlreadyEnrolled
            | Self::Busy
            | Self::Unexpected { .. } => RecoveryAction::RetryNow,
        }
    }

    /// Detected locally, before any provider round trip
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidPhoneNumber | Self::MalformedCode)
    }
}

impl From<ProviderError> for VerificationError {
    fn from(err: ProviderError) -> Self {
        match err.code {
            ProviderErrorCode::InvalidPhoneNumber => Self::InvalidPhoneNumber,
            ProviderErrorCode::QuotaExceeded => Self::QuotaExceeded,
            ProviderErrorCode::TooManyRequests => Self::RateLimited,
            ProviderErrorCode::MissingVerificationCode => Self::MalformedCode,
            ProviderErrorCode::CaptchaCheckFailed => Self::CaptchaFailed,
            ProviderErrorCode::InvalidVerificationCode => Self::InvalidCode,
            ProviderErrorCode::SessionExpired => Self::ChallengeExpired,
            ProviderErrorCode::InvalidSession => Self::NoActiveChallenge,
            ProviderErrorCode::NotAuthenticated => Self::NotAuthenticated,
            ProviderErrorCode::Unavailable => Self::ProviderUnavailable,
            ProviderErrorCode::Unknown(_) => Self::Unexpected {
                detail: err.to_string(),
            },
        }
    }
}

/// Errors surfaced by the signup state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignupError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Please correct the highlighted fields.")]
    InvalidProfile(ValidationErrors),

    #[error("Cannot {action} during the {step} step.")]
    InvalidTransition {
        action: &'static str,
        step: SignupStep,
    },

    #[error("A request is already in progress.")]
    Busy,

    #[error("Failed to update user details. Please try again.")]
    ProfileSubmission { detail: String },
}

impl SignupError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Verification(err) => err.code(),
            Self::InvalidProfile(_) => "INVALID_PROFILE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Busy => "BUSY",
            Self::ProfileSubmission { .. } => "PROFILE_SUBMISSION_FAILED",
        }
    }

    pub fn recovery(&self) -> RecoveryAction {
        match self {
            Self::Verification(err) => err.recovery(),
            Self::InvalidProfile(_) => RecoveryAction::FixInput,
            Self::InvalidTransition { .. } | Self::Busy | Self::ProfileSubmission { .. } => {
                RecoveryAction::RetryNow
            }
        }
    }
}

/// Errors from the Aadhaar document step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KycError {
    #[error("Please select an Aadhaar PDF file")]
    MissingDocument,

    #[error("Please enter the password for the Aadhaar PDF")]
    MissingPassword,

    #[error("The selected Aadhaar file must be a PDF")]
    UnsupportedDocument,

    #[error("Could not read the Aadhaar document. Please check the password and try again.")]
    ExtractionFailed { detail: String },

    #[error("Enter a valid 12-digit Aadhar number.")]
    InvalidAadhaarNumber,
}

impl KycError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingDocument => "MISSING_DOCUMENT",
            Self::MissingPassword => "MISSING_PASSWORD",
            Self::UnsupportedDocument => "UNSUPPORTED_DOCUMENT",
            Self::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            Self::InvalidAadhaarNumber => "INVALID_AADHAAR_NUMBER",
        }
    }
}

/// Errors from the platform fee checkout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Please agree to pay the platform fees")]
    TermsNotAccepted,

    #[error("Payment cancelled")]
    Cancelled,

    #[error("Payment failed: {description}")]
    Failed { code: String, description: String },
}

impl PaymentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TermsNotAccepted => "TERMS_NOT_ACCEPTED",
            Self::Cancelled => "PAYMENT_CANCELLED",
            Self::Failed { .. } => "PAYMENT_FAILED",
        }
    }
}

/// User-facing description of the last error for the active step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Suggested next step
    pub recovery: RecoveryAction,
}

impl ErrorNotice {
    pub fn new(code: impl Into<String>, message: impl Into<String>, recovery: RecoveryAction) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recovery,
        }
    }
}

impl From<&VerificationError> for ErrorNotice {
    fn from(err: &VerificationError) -> Self {
        ErrorNotice::new(err.code(), err.to_string(), err.recovery())
    }
}

impl From<&SignupError> for ErrorNotice {
    fn from(err: &SignupError) -> Self {
        ErrorNotice::new(err.code(), err.to_string(), err.recovery())
    }
}

impl From<&KycError> for ErrorNotice {
    fn from(err: &KycError) -> Self {
        let recovery = match err {
            KycError::ExtractionFailed { .. } => RecoveryAction::RetryNow,
            _ => RecoveryAction::FixInput,
        };
        ErrorNotice::new(err.code(), err.to_string(), recovery)
    }
}

impl From<&PaymentError> for ErrorNotice {
    fn from(err: &PaymentError) -> Self {
        let recovery = match err {
            PaymentError::TermsNotAccepted => RecoveryAction::FixInput,
            _ => RecoveryAction::RetryNow,
        };
        ErrorNotice::new(err.code(), err.to_string(), recovery)
    }
}
