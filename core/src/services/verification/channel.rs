//! Challenge channels for primary sign-in and second-factor enrollment

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use super::traits::{ChallengeChannel, MultiFactorProvider, PhoneAuthProvider};
use crate::domain::entities::challenge::{Challenge, ChallengeId};
use crate::domain::entities::identity::{AuthenticatedIdentity, EnrolledFactor, EnrollmentSession};
use crate::errors::ProviderError;

/// Display name given to an enrolled phone factor
pub const DEFAULT_FACTOR_DISPLAY_NAME: &str = "Phone Number";

/// Signs the user in with a phone code
pub struct PhoneSignInChannel {
    provider: Arc<dyn PhoneAuthProvider>,
}

impl PhoneSignInChannel {
    pub fn new(provider: Arc<dyn PhoneAuthProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ChallengeChannel for PhoneSignInChannel {
    type Outcome = AuthenticatedIdentity;

    fn name(&self) -> &'static str {
        "sign_in"
    }

    async fn issue(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError> {
        self.provider.request_challenge(phone_e164).await
    }

    async fn confirm(&self, challenge: &Challenge, code: &str) -> Result<AuthenticatedIdentity, ProviderError> {
        self.provider.confirm_challenge(challenge, code).await
    }
}

/// Enrolls a second phone factor for an authenticated identity
///
/// Codes can only be issued once an enrollment session has been attached.
pub struct EnrollmentChannel {
    provider: Arc<dyn MultiFactorProvider>,
    identity: AuthenticatedIdentity,
    session: Mutex<Option<EnrollmentSession>>,
    display_name: String,
}

impl EnrollmentChannel {
    pub fn new(provider: Arc<dyn MultiFactorProvider>, identity: AuthenticatedIdentity) -> Self {
        Self {
            provider,
            identity,
            session: Mutex::new(None),
            display_name: DEFAULT_FACTOR_DISPLAY_NAME.to_string(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn identity(&self) -> &AuthenticatedIdentity {
        &self.identity
    }

    pub fn provider(&self) -> &Arc<dyn MultiFactorProvider> {
        &self.provider
    }

    pub fn set_session(&self, session: EnrollmentSession) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn has_session(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[async_trait]
impl ChallengeChannel for EnrollmentChannel {
    type Outcome = EnrolledFactor;

    fn name(&self) -> &'static str {
        "mfa_enrollment"
    }

    async fn issue(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError> {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(ProviderError::not_authenticated)?;
        self.provider
            .request_enrollment_challenge(&self.identity, &session, phone_e164)
            .await
    }

    async fn confirm(&self, challenge: &Challenge, code: &str) -> Result<EnrolledFactor, ProviderError> {
        self.provider
            .finalize_enrollment(&self.identity, challenge, code, &self.display_name)
            .await
    }
}
