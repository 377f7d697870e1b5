//! Signup state machine

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use ob_shared::VerificationConfig;
use tokio::sync::broadcast;
use tokio::time::timeout;

use super::types::SignupAction;
use crate::domain::entities::challenge::Challenge;
use crate::domain::entities::identity::AuthenticatedIdentity;
use crate::domain::entities::phone_number::PhoneNumber;
use crate::domain::entities::profile::ProfileForm;
use crate::domain::entities::signup::{
    MfaStatus, SignupCompletion, SignupEvent, SignupState, SignupStep,
};
use crate::errors::{ErrorNotice, SignupError, VerificationError};
use crate::services::mfa::MfaEnrollment;
use crate::services::verification::{
    CodeInput, MultiFactorProvider, PhoneAuthProvider, PhoneSignInChannel, ProfileService,
    ResendOutcome, VerificationSession,
};

const EVENT_CAPACITY: usize = 32;

/// Sequences phone entry → code verification → user details → optional
/// second-factor setup
///
/// Exactly one step is active at a time. Each step only accepts its own
/// actions; anything else fails with [`SignupError::InvalidTransition`] and
/// leaves the step unchanged. The last failure is kept as an [`ErrorNotice`]
/// until the next successful transition.
pub struct SignupStateMachine {
    session: VerificationSession<PhoneSignInChannel>,
    mfa_provider: Option<Arc<dyn MultiFactorProvider>>,
    profiles: Arc<dyn ProfileService>,
    config: VerificationConfig,
    state: Mutex<MachineState>,
    events: broadcast::Sender<SignupEvent>,
}

struct MachineState {
    current: SignupState,
    loading: HashSet<SignupAction>,
    last_error: Option<ErrorNotice>,
    identity: Option<AuthenticatedIdentity>,
    verified_phone: Option<PhoneNumber>,
    mfa: Option<Arc<MfaEnrollment>>,
}

/// Clears an action's loading flag when it settles
struct Loading<'a> {
    state: &'a Mutex<MachineState>,
    action: SignupAction,
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .loading
            .remove(&self.action);
    }
}

impl SignupStateMachine {
    /// Machine without second-factor setup
    pub fn new(
        provider: Arc<dyn PhoneAuthProvider>,
        profiles: Arc<dyn ProfileService>,
        config: VerificationConfig,
    ) -> Self {
        let channel = Arc::new(PhoneSignInChannel::new(provider));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: VerificationSession::new(channel, config.clone()),
            mfa_provider: None,
            profiles,
            config,
            state: Mutex::new(MachineState {
                current: SignupState::PhoneInput,
                loading: HashSet::new(),
                last_error: None,
                identity: None,
                verified_phone: None,
                mfa: None,
            }),
            events,
        }
    }

    /// Offer second-factor enrollment after the user details step
    pub fn with_mfa(mut self, provider: Arc<dyn MultiFactorProvider>) -> Self {
        self.mfa_provider = Some(provider);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check the step and claim the action's loading flag
    fn begin(&self, action: SignupAction, expected: SignupStep) -> Result<Loading<'_>, SignupError> {
        let rejection = {
            let mut state = self.lock();
            let step = state.current.step();
            if step != expected {
                Some(SignupError::InvalidTransition {
                    action: action.describe(),
                    step,
                })
            } else if !state.loading.insert(action) {
                Some(SignupError::Busy)
            } else {
                None
            }
        };
        match rejection {
            Some(err) => Err(self.fail(err)),
            None => Ok(Loading {
                state: &self.state,
                action,
            }),
        }
    }

    /// Check the step for an action that completes synchronously
    fn require_step(&self, action: SignupAction, expected: SignupStep) -> Result<(), SignupError> {
        let step = self.lock().current.step();
        if step != expected {
            return Err(self.fail(SignupError::InvalidTransition {
                action: action.describe(),
                step,
            }));
        }
        Ok(())
    }

    /// Record a failure as the current error notice
    fn fail(&self, err: SignupError) -> SignupError {
        if matches!(err, SignupError::Verification(VerificationError::Superseded)) {
            return err;
        }
        let notice = ErrorNotice::from(&err);
        let mut state = self.lock();
        tracing::warn!(
            step = %state.current.step(),
            error_code = %notice.code,
            recovery = ?notice.recovery,
            event = "signup_action_failed",
            "{}",
            notice.message
        );
        state.last_error = Some(notice);
        err
    }

    fn superseded() -> SignupError {
        SignupError::Verification(VerificationError::Superseded)
    }

    fn transition(&self, state: &mut MachineState, next: SignupState) {
        let from = state.current.step();
        let to = next.step();
        state.current = next;
        state.last_error = None;
        tracing::info!(
            from = %from,
            to = %to,
            event = "signup_step_changed",
            "Signup step changed"
        );
        let _ = self.events.send(SignupEvent::StepChanged { from, to });
    }

    fn complete(&self, state: &mut MachineState, mfa: MfaStatus) -> Result<SignupCompletion, SignupError> {
        let (Some(verified_phone), Some(identity)) = (state.verified_phone.clone(), state.identity.as_ref())
        else {
            return Err(SignupError::Verification(VerificationError::NotAuthenticated));
        };
        let completion = SignupCompletion {
            verified_phone,
            identity_uid: identity.uid.clone(),
            mfa,
        };
        self.transition(
            state,
            SignupState::Completed {
                completion: completion.clone(),
            },
        );
        tracing::info!(
            uid = %completion.identity_uid,
            phone = %completion.verified_phone.masked(),
            mfa = ?completion.mfa,
            event = "signup_completed",
            "Signup completed"
        );
        let _ = self.events.send(SignupEvent::Completed(completion.clone()));
        Ok(completion)
    }

    /// Request a code for the entered phone number
    pub async fn submit_phone(&self, phone: &str) -> Result<Challenge, SignupError> {
        let _loading = self.begin(SignupAction::SubmitPhone, SignupStep::PhoneInput)?;

        let challenge = self
            .session
            .start(phone)
            .await
            .map_err(|err| self.fail(err.into()))?;

        let mut state = self.lock();
        if state.current.step() != SignupStep::PhoneInput {
            return Err(Self::superseded());
        }
        self.transition(
            &mut state,
            SignupState::OtpVerification {
                challenge: challenge.clone(),
            },
        );
        Ok(challenge)
    }

    /// Submit the one-time code; advances to the user details step on success
    pub async fn submit_code(&self, code: &str) -> Result<PhoneNumber, SignupError> {
        let _loading = self.begin(SignupAction::SubmitCode, SignupStep::OtpVerification)?;

        let result = self.session.submit(code).await;
        let verified = match result {
            Ok(verified) => verified,
            Err(err) => {
                self.refresh_challenge();
                return Err(self.fail(err.into()));
            }
        };

        let mut state = self.lock();
        if state.current.step() != SignupStep::OtpVerification {
            return Err(Self::superseded());
        }
        let verified_phone = verified.challenge.phone.clone();
        state.identity = Some(verified.outcome);
        state.verified_phone = Some(verified_phone.clone());
        self.transition(
            &mut state,
            SignupState::UserDetails {
                verified_phone: verified_phone.clone(),
            },
        );
        Ok(verified_phone)
    }

    /// Request another code once the cooldown has run out
    pub async fn resend(&self) -> Result<ResendOutcome, SignupError> {
        let _loading = self.begin(SignupAction::Resend, SignupStep::OtpVerification)?;

        let outcome = self
            .session
            .resend()
            .await
            .map_err(|err| self.fail(err.into()))?;

        if let ResendOutcome::Resent(challenge) = &outcome {
            let mut state = self.lock();
            if let SignupState::OtpVerification { challenge: current } = &mut state.current {
                *current = challenge.clone();
                state.last_error = None;
            }
        }
        Ok(outcome)
    }

    /// Leave code verification and return to phone entry
    pub fn go_back(&self) -> Result<(), SignupError> {
        self.require_step(SignupAction::GoBack, SignupStep::OtpVerification)?;
        self.session.cancel();
        let mut state = self.lock();
        self.transition(&mut state, SignupState::PhoneInput);
        Ok(())
    }

    /// Validate and save the user details
    ///
    /// The phone field is always taken from the verified number, whatever the
    /// form says. On success the flow moves to second-factor setup when it is
    /// offered, otherwise it completes.
    pub async fn submit_profile(&self, form: ProfileForm) -> Result<SignupStep, SignupError> {
        let _loading = self.begin(SignupAction::SubmitProfile, SignupStep::UserDetails)?;

        let (identity, verified_phone) = {
            let state = self.lock();
            match (state.identity.clone(), state.verified_phone.clone()) {
                (Some(identity), Some(phone)) => (identity, phone),
                _ => {
                    drop(state);
                    return Err(self.fail(VerificationError::NotAuthenticated.into()));
                }
            }
        };

        let mut form = form;
        form.phone = verified_phone.as_str().to_string();
        let profile = form
            .validate_at(Utc::now().date_naive())
            .map_err(|errors| {
                tracing::debug!(
                    fields = errors.len(),
                    event = "profile_validation_failed",
                    "User details failed validation"
                );
                self.fail(SignupError::InvalidProfile(errors))
            })?;

        let saved = timeout(
            self.config.request_timeout(),
            self.profiles.save_profile(&identity, &profile),
        )
        .await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                return Err(self.fail(SignupError::ProfileSubmission {
                    detail: err.to_string(),
                }))
            }
            Err(_) => {
                return Err(self.fail(SignupError::ProfileSubmission {
                    detail: String::from("profile save timed out"),
                }))
            }
        }
        tracing::info!(
            uid = %identity.uid,
            event = "profile_saved",
            "User details saved"
        );

        let mut state = self.lock();
        if state.current.step() != SignupStep::UserDetails {
            return Err(Self::superseded());
        }
        match &self.mfa_provider {
            Some(provider) => {
                state.mfa = Some(Arc::new(MfaEnrollment::new(
                    Arc::clone(provider),
                    identity,
                    self.config.clone(),
                )));
                self.transition(
                    &mut state,
                    SignupState::MfaSetup {
                        enrollment_challenge: None,
                    },
                );
            }
            None => {
                self.complete(&mut state, MfaStatus::NotOffered)?;
            }
        }
        Ok(state.current.step())
    }

    fn mfa(&self) -> Result<Arc<MfaEnrollment>, SignupError> {
        let mfa = self.lock().mfa.clone();
        mfa.ok_or_else(|| self.fail(VerificationError::NotAuthenticated.into()))
    }

    fn set_enrollment_challenge(&self, challenge: Option<Challenge>) {
        let mut state = self.lock();
        if let SignupState::MfaSetup {
            enrollment_challenge,
        } = &mut state.current
        {
            *enrollment_challenge = challenge;
            state.last_error = None;
        }
    }

    /// Send an enrollment code to the second-factor phone
    pub async fn enroll_mfa(&self, phone: &str) -> Result<Challenge, SignupError> {
        let _loading = self.begin(SignupAction::EnrollMfa, SignupStep::MfaSetup)?;
        let mfa = self.mfa()?;

        let challenge = mfa
            .enroll(phone)
            .await
            .map_err(|err| self.fail(err.into()))?;
        self.set_enrollment_challenge(Some(challenge.clone()));
        Ok(challenge)
    }

    /// Confirm the enrollment code and finish signup
    pub async fn confirm_mfa(&self, code: &str) -> Result<SignupCompletion, SignupError> {
        let _loading = self.begin(SignupAction::ConfirmMfa, SignupStep::MfaSetup)?;
        let mfa = self.mfa()?;

        let factor = match mfa.confirm(code).await {
            Ok(factor) => factor,
            Err(err) => {
                self.set_enrollment_challenge(mfa.challenge());
                return Err(self.fail(err.into()));
            }
        };

        let mut state = self.lock();
        if state.current.step() != SignupStep::MfaSetup {
            return Err(Self::superseded());
        }
        self.complete(&mut state, MfaStatus::Enrolled { factor })
    }

    /// Resend the enrollment code once its cooldown has run out
    pub async fn resend_mfa(&self) -> Result<ResendOutcome, SignupError> {
        let _loading = self.begin(SignupAction::ResendMfa, SignupStep::MfaSetup)?;
        let mfa = self.mfa()?;

        let outcome = mfa.resend().await.map_err(|err| self.fail(err.into()))?;
        if let ResendOutcome::Resent(challenge) = &outcome {
            self.set_enrollment_challenge(Some(challenge.clone()));
        }
        Ok(outcome)
    }

    /// Finish signup without a second factor
    pub fn skip_mfa(&self) -> Result<SignupCompletion, SignupError> {
        self.require_step(SignupAction::SkipMfa, SignupStep::MfaSetup)?;
        // An in-flight enrollment may still bind the factor on the provider
        if self.is_loading(SignupAction::EnrollMfa) || self.is_loading(SignupAction::ConfirmMfa) {
            return Err(self.fail(SignupError::Busy));
        }
        let mfa = self.mfa()?;
        if mfa.is_enrolled() {
            return Err(self.fail(VerificationError::AlreadyEnrolled.into()));
        }
        mfa.cancel();

        let mut state = self.lock();
        self.complete(&mut state, MfaStatus::Skipped)
    }

    fn refresh_challenge(&self) {
        let Some(challenge) = self.session.challenge() else {
            return;
        };
        let mut state = self.lock();
        if let SignupState::OtpVerification { challenge: current } = &mut state.current {
            if current.id == challenge.id {
                *current = challenge;
            }
        }
    }

    /// Type one digit into the active step's code boxes
    pub fn type_digit(&self, c: char) -> bool {
        match self.step() {
            SignupStep::OtpVerification => self.session.type_digit(c),
            SignupStep::MfaSetup => self.lock().mfa.clone().is_some_and(|mfa| mfa.type_digit(c)),
            _ => false,
        }
    }

    pub fn backspace(&self) -> Option<char> {
        match self.step() {
            SignupStep::OtpVerification => self.session.backspace(),
            SignupStep::MfaSetup => self.lock().mfa.clone().and_then(|mfa| mfa.backspace()),
            _ => None,
        }
    }

    /// Code boxes of the active step
    pub fn code_input(&self) -> CodeInput {
        match self.step() {
            SignupStep::OtpVerification => self.session.code_input(),
            SignupStep::MfaSetup => match self.lock().mfa.clone() {
                Some(mfa) => mfa.code_input(),
                None => CodeInput::new(self.config.code_length),
            },
            _ => CodeInput::new(self.config.code_length),
        }
    }

    /// Seconds until the active step allows a resend
    pub fn resend_remaining(&self) -> u32 {
        match self.step() {
            SignupStep::OtpVerification => self.session.resend_remaining(),
            SignupStep::MfaSetup => self
                .lock()
                .mfa
                .clone()
                .map_or(0, |mfa| mfa.resend_remaining()),
            _ => 0,
        }
    }

    pub fn can_resend(&self) -> bool {
        match self.step() {
            SignupStep::OtpVerification => {
                !self.is_loading(SignupAction::Resend) && self.session.can_resend()
            }
            SignupStep::MfaSetup => {
                let mfa = self.lock().mfa.clone();
                !self.is_loading(SignupAction::ResendMfa) && mfa.is_some_and(|mfa| mfa.can_resend())
            }
            _ => false,
        }
    }

    pub fn state(&self) -> SignupState {
        self.lock().current.clone()
    }

    pub fn step(&self) -> SignupStep {
        self.lock().current.step()
    }

    pub fn last_error(&self) -> Option<ErrorNotice> {
        self.lock().last_error.clone()
    }

    pub fn is_loading(&self, action: SignupAction) -> bool {
        self.lock().loading.contains(&action)
    }

    /// Whether any action of the active step is in flight
    pub fn is_busy(&self) -> bool {
        !self.lock().loading.is_empty()
    }

    pub fn identity(&self) -> Option<AuthenticatedIdentity> {
        self.lock().identity.clone()
    }

    pub fn verified_phone(&self) -> Option<PhoneNumber> {
        self.lock().verified_phone.clone()
    }

    pub fn offers_mfa(&self) -> bool {
        self.mfa_provider.is_some()
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Step changes and completion
    pub fn subscribe(&self) -> broadcast::Receiver<SignupEvent> {
        self.events.subscribe()
    }
}
