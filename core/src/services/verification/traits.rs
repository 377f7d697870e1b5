//! Provider seams for phone authentication, second-factor enrollment and
//! profile storage

use async_trait::async_trait;

use crate::domain::entities::challenge::{Challenge, ChallengeId};
use crate::domain::entities::identity::{AuthenticatedIdentity, EnrolledFactor, EnrollmentSession};
use crate::domain::entities::profile::ValidatedProfile;
use crate::errors::ProviderError;

/// External phone-auth provider for primary sign-in
#[async_trait]
pub trait PhoneAuthProvider: Send + Sync {
    /// Send a one-time code to `phone_e164`, returning the provider's handle for it
    async fn request_challenge(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError>;
    /// Exchange a code for a primary session
    async fn confirm_challenge(
        &self,
        challenge: &Challenge,
        code: &str,
    ) -> Result<AuthenticatedIdentity, ProviderError>;
}

/// External provider for binding a second phone factor to an identity
#[async_trait]
pub trait MultiFactorProvider: Send + Sync {
    /// Obtain a session authorizing enrollment; fails when the identity is no longer valid
    async fn get_enrollment_session(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<EnrollmentSession, ProviderError>;
    /// Send a one-time code to the phone being enrolled
    async fn request_enrollment_challenge(
        &self,
        identity: &AuthenticatedIdentity,
        session: &EnrollmentSession,
        phone_e164: &str,
    ) -> Result<ChallengeId, ProviderError>;
    /// Verify the code and bind the phone as a second factor
    async fn finalize_enrollment(
        &self,
        identity: &AuthenticatedIdentity,
        challenge: &Challenge,
        code: &str,
        display_name: &str,
    ) -> Result<EnrolledFactor, ProviderError>;
}

/// Stores the user details collected during signup
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn save_profile(
        &self,
        identity: &AuthenticatedIdentity,
        profile: &ValidatedProfile,
    ) -> Result<(), ProviderError>;
}

/// One way of issuing and confirming codes
///
/// A [`VerificationSession`](super::VerificationSession) is generic over its
/// channel, so primary sign-in and second-factor enrollment share the same
/// request/cooldown/submit mechanics.
#[async_trait]
pub trait ChallengeChannel: Send + Sync {
    /// What a confirmed code yields
    type Outcome: Clone + Send + Sync + 'static;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn issue(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError>;

    async fn confirm(&self, challenge: &Challenge, code: &str) -> Result<Self::Outcome, ProviderError>;
}
