//! Domain entities representing core business objects.

pub mod aadhaar;
pub mod account;
pub mod challenge;
pub mod identity;
pub mod payment;
pub mod phone_number;
pub mod profile;
pub mod signup;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use account::{ForgotPasswordForm, LoginCredentials, LoginForm, PasswordResetForm};
pub use aadhaar::{AadhaarDocument, AadhaarRecord, AadhaarUpload};
pub use challenge::{Challenge, ChallengeId, ChallengeStatus};
pub use identity::{AuthenticatedIdentity, EnrolledFactor, EnrollmentSession};
pub use payment::{CheckoutOrder, PaymentMethod, PaymentReceipt};
pub use phone_number::PhoneNumber;
pub use profile::{ProfileForm, ValidatedProfile, INDIAN_STATES};
pub use signup::{MfaStatus, SignupCompletion, SignupEvent, SignupState, SignupStep};
