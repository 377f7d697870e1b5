//! Business services containing the onboarding flow logic.

pub mod kyc;
pub mod mfa;
pub mod payment;
pub mod signup;
pub mod timer;
pub mod verification;

// Re-export commonly used types
pub use kyc::{AadhaarDocumentService, AadhaarVerification};
pub use mfa::MfaEnrollment;
pub use payment::{PaymentGateway, PlatformFeeCheckout, PLATFORM_FEE_DESCRIPTION};
pub use signup::{SignupAction, SignupStateMachine};
pub use timer::{CountdownTimer, TimerEvent};
pub use verification::{
    ChallengeChannel, CodeInput, EnrollmentChannel, MultiFactorProvider, PhoneAuthProvider,
    PhoneSignInChannel, ProfileService, ResendOutcome, VerificationSession, Verified,
    DEFAULT_FACTOR_DISPLAY_NAME,
};
