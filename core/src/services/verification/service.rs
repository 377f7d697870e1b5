//! Verification session: one phone number, one outstanding challenge

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ob_shared::VerificationConfig;
use tokio::time::timeout;

use super::traits::ChallengeChannel;
use super::types::{CodeInput, ResendOutcome, Verified};
use crate::domain::entities::challenge::Challenge;
use crate::domain::entities::phone_number::PhoneNumber;
use crate::errors::VerificationError;
use crate::services::timer::CountdownTimer;

/// Code request / resend / submit workflow for a single phone number
///
/// All operations take `&self`. State sits behind a mutex that is never held
/// across a provider call; each provider call is tagged with the session
/// epoch it started in, and its result is dropped (`Superseded`) if `start`,
/// `resend` or `cancel` moved the session on in the meantime.
pub struct VerificationSession<C: ChallengeChannel> {
    channel: Arc<C>,
    config: VerificationConfig,
    state: Mutex<SessionState<C::Outcome>>,
    timer: CountdownTimer,
}

struct SessionState<O> {
    epoch: u64,
    phone: Option<PhoneNumber>,
    challenge: Option<Challenge>,
    outcome: Option<O>,
    input: CodeInput,
    attempts: u32,
    last_error: Option<VerificationError>,
    requesting: bool,
    confirming: bool,
}

#[derive(Clone, Copy)]
enum Flight {
    Request,
    Confirm,
}

/// Clears an in-flight flag when the call settles or its future is dropped
struct InFlight<'a, O> {
    state: &'a Mutex<SessionState<O>>,
    flight: Flight,
    epoch: u64,
}

impl<O> Drop for InFlight<'_, O> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.epoch != self.epoch {
            return;
        }
        match self.flight {
            Flight::Request => state.requesting = false,
            Flight::Confirm => state.confirming = false,
        }
    }
}

impl<C: ChallengeChannel> VerificationSession<C> {
    pub fn new(channel: Arc<C>, config: VerificationConfig) -> Self {
        let timer = CountdownTimer::new(config.tick_period());
        let input = CodeInput::new(config.code_length);
        Self {
            channel,
            config,
            state: Mutex::new(SessionState {
                epoch: 0,
                phone: None,
                challenge: None,
                outcome: None,
                input,
                attempts: 0,
                last_error: None,
                requesting: false,
                confirming: false,
            }),
            timer,
        }
    }

    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, SessionState<C::Outcome>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a code for `phone`, replacing any outstanding challenge
    pub async fn start(&self, phone: &str) -> Result<Challenge, VerificationError> {
        let phone = PhoneNumber::parse(phone).map_err(|err| {
            tracing::debug!(
                channel = self.channel.name(),
                event = "phone_rejected",
                "Rejected malformed phone number"
            );
            err
        })?;
        self.request(phone).await
    }

    /// Request another code for the same phone once the cooldown has run out
    ///
    /// While the countdown is still running this returns
    /// [`ResendOutcome::CoolingDown`] without contacting the provider.
    pub async fn resend(&self) -> Result<ResendOutcome, VerificationError> {
        let phone = {
            let state = self.lock();
            let confirmed = state.challenge.as_ref().is_some_and(Challenge::is_confirmed);
            match state.phone.clone() {
                Some(phone) if !confirmed => phone,
                _ => return Err(VerificationError::NoActiveChallenge),
            }
        };

        if self.timer.is_running() {
            let remaining = self.timer.remaining();
            tracing::debug!(
                channel = self.channel.name(),
                remaining,
                event = "resend_cooling_down",
                "Resend ignored while cooldown is running"
            );
            return Ok(ResendOutcome::CoolingDown { remaining });
        }

        tracing::info!(
            channel = self.channel.name(),
            phone = %phone.masked(),
            event = "otp_resend_requested",
            "Resending verification code"
        );
        self.request(phone).await.map(ResendOutcome::Resent)
    }

    async fn request(&self, phone: PhoneNumber) -> Result<Challenge, VerificationError> {
        let epoch = {
            let mut state = self.lock();
            if state.requesting {
                return Err(VerificationError::Busy);
            }
            state.epoch += 1;
            state.requesting = true;
            state.confirming = false;
            state.phone = Some(phone.clone());
            state.challenge = None;
            state.outcome = None;
            state.attempts = 0;
            state.last_error = None;
            state.input.clear();
            state.epoch
        };
        let _flight = InFlight {
            state: &self.state,
            flight: Flight::Request,
            epoch,
        };
        self.timer.cancel();

        let phone_e164 = phone.to_e164(&self.config.country_code);
        tracing::info!(
            channel = self.channel.name(),
            phone = %phone.masked(),
            event = "otp_requested",
            "Requesting verification code"
        );

        let result = match timeout(self.config.request_timeout(), self.channel.issue(&phone_e164)).await {
            Ok(Ok(id)) => Ok(id),
            Ok(Err(err)) => {
                tracing::warn!(
                    channel = self.channel.name(),
                    phone = %phone.masked(),
                    provider_code = %err.code,
                    error = %err.message,
                    event = "otp_request_failed",
                    "Provider rejected verification code request"
                );
                Err(VerificationError::from(err))
            }
            Err(_) => {
                tracing::warn!(
                    channel = self.channel.name(),
                    phone = %phone.masked(),
                    timeout_secs = self.config.request_timeout_secs,
                    event = "otp_request_timeout",
                    "Verification code request timed out"
                );
                Err(VerificationError::ProviderUnavailable)
            }
        };

        let mut state = self.lock();
        if state.epoch != epoch {
            tracing::debug!(
                channel = self.channel.name(),
                event = "stale_request_discarded",
                "Discarded code request result for an abandoned session"
            );
            return Err(VerificationError::Superseded);
        }

        match result {
            Ok(id) => {
                let challenge = Challenge::new(id, phone);
                state.challenge = Some(challenge.clone());
                drop(state);
                self.timer.start(self.config.resend_cooldown_secs);
                tracing::info!(
                    channel = self.channel.name(),
                    phone = %challenge.phone.masked(),
                    challenge_id = %challenge.id,
                    cooldown_secs = self.config.resend_cooldown_secs,
                    event = "otp_sent",
                    "Verification code sent"
                );
                Ok(challenge)
            }
            Err(err) => {
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Submit a code against the outstanding challenge
    pub async fn submit(&self, code: &str) -> Result<Verified<C::Outcome>, VerificationError> {
        let code = code.trim();
        if !self.is_well_formed(code) {
            return Err(VerificationError::MalformedCode);
        }

        let (snapshot, epoch) = {
            let mut state = self.lock();
            if state.confirming {
                return Err(VerificationError::Busy);
            }
            let max_age = self.config.challenge_max_age();
            let Some(challenge) = state.challenge.as_mut().filter(|c| c.is_resubmittable()) else {
                return Err(VerificationError::NoActiveChallenge);
            };
            if challenge.is_older_than(max_age) {
                challenge.mark_expired();
                tracing::info!(
                    channel = self.channel.name(),
                    challenge_id = %challenge.id,
                    event = "otp_expired",
                    "Verification challenge outlived its maximum age"
                );
                state.input.reset();
                state.last_error = Some(VerificationError::ChallengeExpired);
                return Err(VerificationError::ChallengeExpired);
            }
            let snapshot = challenge.clone();
            state.confirming = true;
            state.attempts += 1;
            (snapshot, state.epoch)
        };
        let _flight = InFlight {
            state: &self.state,
            flight: Flight::Confirm,
            epoch,
        };

        let result = match timeout(self.config.request_timeout(), self.channel.confirm(&snapshot, code)).await {
            Ok(result) => result.map_err(VerificationError::from),
            Err(_) => Err(VerificationError::ProviderUnavailable),
        };

        let mut state = self.lock();
        let current = state.challenge.as_ref().map(|c| c.id.clone());
        if state.epoch != epoch || current.as_ref() != Some(&snapshot.id) {
            tracing::debug!(
                channel = self.channel.name(),
                challenge_id = %snapshot.id,
                event = "stale_confirmation_discarded",
                "Discarded confirmation for a superseded challenge"
            );
            return Err(VerificationError::Superseded);
        }

        match result {
            Ok(outcome) => {
                let mut confirmed = snapshot;
                confirmed.mark_confirmed();
                state.challenge = Some(confirmed.clone());
                state.outcome = Some(outcome.clone());
                state.last_error = None;
                state.input.clear();
                let attempts = state.attempts;
                drop(state);
                self.timer.cancel();
                tracing::info!(
                    channel = self.channel.name(),
                    phone = %confirmed.phone.masked(),
                    attempts,
                    event = "otp_verified",
                    "Verification code confirmed"
                );
                Ok(Verified {
                    challenge: confirmed,
                    outcome,
                })
            }
            Err(err) => {
                if let Some(challenge) = state.challenge.as_mut() {
                    match err {
                        VerificationError::InvalidCode | VerificationError::MalformedCode => {
                            challenge.mark_failed()
                        }
                        VerificationError::ChallengeExpired | VerificationError::NoActiveChallenge => {
                            challenge.mark_expired()
                        }
                        _ => {}
                    }
                }
                state.input.reset();
                state.last_error = Some(err.clone());
                tracing::warn!(
                    channel = self.channel.name(),
                    challenge_id = %snapshot.id,
                    attempts = state.attempts,
                    error_code = err.code(),
                    event = "otp_verification_failed",
                    "Verification code rejected"
                );
                Err(err)
            }
        }
    }

    /// Abandon the session: drop the challenge, stop the countdown, ignore late results
    pub fn cancel(&self) {
        {
            let mut state = self.lock();
            state.epoch += 1;
            state.phone = None;
            state.challenge = None;
            state.outcome = None;
            state.attempts = 0;
            state.last_error = None;
            state.requesting = false;
            state.confirming = false;
            state.input.clear();
        }
        self.timer.cancel();
        tracing::debug!(
            channel = self.channel.name(),
            event = "verification_cancelled",
            "Verification session cancelled"
        );
    }

    /// Type one character into the code boxes
    pub fn type_digit(&self, c: char) -> bool {
        self.lock().input.push(c)
    }

    pub fn backspace(&self) -> Option<char> {
        self.lock().input.pop()
    }

    /// Submit whatever is in the code boxes
    pub async fn submit_entered(&self) -> Result<Verified<C::Outcome>, VerificationError> {
        let code = self.lock().input.value().to_string();
        self.submit(&code).await
    }

    fn is_well_formed(&self, code: &str) -> bool {
        code.len() == self.config.code_length && code.chars().all(|c| c.is_ascii_digit())
    }

    pub fn code_input(&self) -> CodeInput {
        self.lock().input.clone()
    }

    pub fn challenge(&self) -> Option<Challenge> {
        self.lock().challenge.clone()
    }

    pub fn phone(&self) -> Option<PhoneNumber> {
        self.lock().phone.clone()
    }

    pub fn outcome(&self) -> Option<C::Outcome> {
        self.lock().outcome.clone()
    }

    pub fn last_error(&self) -> Option<VerificationError> {
        self.lock().last_error.clone()
    }

    /// Submissions made against the current challenge
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    pub fn is_verified(&self) -> bool {
        self.lock().challenge.as_ref().is_some_and(Challenge::is_confirmed)
    }

    pub fn is_requesting(&self) -> bool {
        self.lock().requesting
    }

    pub fn is_confirming(&self) -> bool {
        self.lock().confirming
    }

    /// Seconds until a resend is allowed
    pub fn resend_remaining(&self) -> u32 {
        if self.timer.is_running() {
            self.timer.remaining()
        } else {
            0
        }
    }

    /// Whether `resend` would contact the provider now
    pub fn can_resend(&self) -> bool {
        let state = self.lock();
        let confirmed = state.challenge.as_ref().is_some_and(Challenge::is_confirmed);
        state.phone.is_some() && !confirmed && !state.requesting && !self.timer.is_running()
    }
}
