//! Second-factor enrollment service

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ob_shared::VerificationConfig;
use tokio::time::timeout;

use crate::domain::entities::challenge::Challenge;
use crate::domain::entities::identity::{AuthenticatedIdentity, EnrolledFactor};
use crate::domain::entities::phone_number::PhoneNumber;
use crate::errors::{ProviderErrorCode, VerificationError};
use crate::services::verification::{
    CodeInput, EnrollmentChannel, MultiFactorProvider, ResendOutcome, VerificationSession,
};

/// Binds a second phone number to an identity
///
/// Runs the same request/cooldown/submit cycle as primary sign-in, preceded
/// by fetching an enrollment session for the identity. Once a factor is
/// enrolled it stays enrolled.
pub struct MfaEnrollment {
    session: VerificationSession<EnrollmentChannel>,
    state: Mutex<EnrollmentState>,
}

#[derive(Default)]
struct EnrollmentState {
    enrolled: Option<EnrolledFactor>,
    acquiring_session: bool,
}

struct Acquiring<'a>(&'a Mutex<EnrollmentState>);

impl Drop for Acquiring<'_> {
    fn drop(&mut self) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .acquiring_session = false;
    }
}

impl MfaEnrollment {
    pub fn new(
        provider: Arc<dyn MultiFactorProvider>,
        identity: AuthenticatedIdentity,
        config: VerificationConfig,
    ) -> Self {
        let channel = Arc::new(EnrollmentChannel::new(provider, identity));
        Self {
            session: VerificationSession::new(channel, config),
            state: Mutex::new(EnrollmentState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EnrollmentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_not_enrolled(&self) -> Result<(), VerificationError> {
        if self.lock().enrolled.is_some() {
            return Err(VerificationError::AlreadyEnrolled);
        }
        Ok(())
    }

    /// Send an enrollment code to `phone`
    pub async fn enroll(&self, phone: &str) -> Result<Challenge, VerificationError> {
        self.ensure_not_enrolled()?;
        let phone = PhoneNumber::parse(phone)?;

        {
            let mut state = self.lock();
            if state.acquiring_session || self.session.is_requesting() {
                return Err(VerificationError::Busy);
            }
            state.acquiring_session = true;
        }
        let acquiring = Acquiring(&self.state);

        let channel = self.session.channel();
        let identity = channel.identity();
        let enrollment_session = match timeout(
            self.session.config().request_timeout(),
            channel.provider().get_enrollment_session(identity),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => {
                tracing::warn!(
                    uid = %identity.uid,
                    provider_code = %err.code,
                    event = "mfa_session_failed",
                    "Could not obtain an enrollment session"
                );
                return Err(match err.code {
                    ProviderErrorCode::Unavailable => VerificationError::ProviderUnavailable,
                    _ => VerificationError::NotAuthenticated,
                });
            }
            Err(_) => return Err(VerificationError::ProviderUnavailable),
        };
        channel.set_session(enrollment_session);
        drop(acquiring);

        tracing::info!(
            uid = %identity.uid,
            phone = %phone.masked(),
            event = "mfa_enrollment_started",
            "Starting second-factor enrollment"
        );
        self.session.start(phone.as_str()).await
    }

    /// Confirm the enrollment code; the factor is bound on success
    pub async fn confirm(&self, code: &str) -> Result<EnrolledFactor, VerificationError> {
        self.ensure_not_enrolled()?;
        let verified = self.session.submit(code).await?;

        let mut state = self.lock();
        // A concurrent confirm may have won the race
        if let Some(existing) = &state.enrolled {
            return Ok(existing.clone());
        }
        state.enrolled = Some(verified.outcome.clone());
        tracing::info!(
            uid = %self.session.channel().identity().uid,
            factor_id = %verified.outcome.factor_id,
            event = "mfa_enrolled",
            "Second factor enrolled"
        );
        Ok(verified.outcome)
    }

    /// Resend the enrollment code, subject to the same cooldown as sign-in
    pub async fn resend(&self) -> Result<ResendOutcome, VerificationError> {
        self.ensure_not_enrolled()?;
        self.session.resend().await
    }

    /// Abandon a pending enrollment; an enrolled factor is kept
    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn is_enrolled(&self) -> bool {
        self.lock().enrolled.is_some()
    }

    pub fn enrolled_factor(&self) -> Option<EnrolledFactor> {
        self.lock().enrolled.clone()
    }

    pub fn identity(&self) -> &AuthenticatedIdentity {
        self.session.channel().identity()
    }

    pub fn challenge(&self) -> Option<Challenge> {
        self.session.challenge()
    }

    pub fn code_input(&self) -> CodeInput {
        self.session.code_input()
    }

    pub fn type_digit(&self, c: char) -> bool {
        self.session.type_digit(c)
    }

    pub fn backspace(&self) -> Option<char> {
        self.session.backspace()
    }

    pub fn resend_remaining(&self) -> u32 {
        self.session.resend_remaining()
    }

    pub fn can_resend(&self) -> bool {
        !self.is_enrolled() && self.session.can_resend()
    }

    pub fn last_error(&self) -> Option<VerificationError> {
        self.session.last_error()
    }
}
