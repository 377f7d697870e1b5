//! Mock Phone-auth Provider
//!
//! Keeps codes in memory and logs them instead of sending an SMS. Also
//! covers second-factor enrollment so the whole flow runs offline.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use ob_core::domain::entities::{
    AuthenticatedIdentity, Challenge, ChallengeId, EnrolledFactor, EnrollmentSession,
};
use ob_core::errors::ProviderError;
use ob_core::services::{MultiFactorProvider, PhoneAuthProvider};
use ob_shared::phone::{is_valid_international_phone, mask_phone_number};
use ob_shared::ProviderConfig;

/// Length of generated codes
pub const MOCK_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone)]
struct IssuedCode {
    phone_e164: String,
    code: String,
    /// Set for enrollment challenges: the uid the factor is bound to
    enrolling_uid: Option<String>,
}

#[derive(Default)]
struct MockState {
    challenges: HashMap<String, IssuedCode>,
    /// Phone -> fixed code; no code is generated or logged for these
    test_numbers: HashMap<String, String>,
    /// Phone -> uid, so a number always signs in as the same user
    users: HashMap<String, String>,
    /// id token -> uid
    tokens: HashMap<String, String>,
    enrollment_sessions: HashSet<String>,
    factors: HashMap<String, Vec<EnrolledFactor>>,
    request_failures: VecDeque<ProviderError>,
    confirm_failures: VecDeque<ProviderError>,
    last_codes: HashMap<String, String>,
}

/// In-memory phone-auth provider for development and testing
///
/// This implementation:
/// - Generates random 6-digit codes (or uses a configured fixed code)
/// - Logs every code it "sends"
/// - Accepts registered test numbers with their fixed codes
/// - Replays scripted failures for request and confirm calls
pub struct MockPhoneAuthProvider {
    state: Mutex<MockState>,
    fixed_code: Option<String>,
    latency: Duration,
    sent: AtomicU64,
}

impl MockPhoneAuthProvider {
    /// Create a provider that generates random codes
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            fixed_code: None,
            latency: Duration::ZERO,
            sent: AtomicU64::new(0),
        }
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        let provider = Self::new();
        match &config.mock_fixed_code {
            Some(code) => provider.with_fixed_code(code.clone()),
            None => provider,
        }
    }

    /// Accept `code` for every challenge
    pub fn with_fixed_code(mut self, code: impl Into<String>) -> Self {
        self.fixed_code = Some(code.into());
        self
    }

    /// Simulate a network round trip on every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Register a test number that always accepts `code`
    pub fn with_test_number(self, phone_e164: impl Into<String>, code: impl Into<String>) -> Self {
        self.lock().test_numbers.insert(phone_e164.into(), code.into());
        self
    }

    /// Fail the next challenge request (sign-in or enrollment) with a provider code
    pub fn fail_next_request(&self, code: &str) {
        self.lock().request_failures.push_back(ProviderError::from_code(code));
    }

    /// Fail the next confirmation (sign-in or enrollment) with a provider code
    pub fn fail_next_confirm(&self, code: &str) {
        self.lock().confirm_failures.push_back(ProviderError::from_code(code));
    }

    /// Most recent code issued to `phone_e164`
    pub fn last_code(&self, phone_e164: &str) -> Option<String> {
        self.lock().last_codes.get(phone_e164).cloned()
    }

    /// Number of codes "sent" so far
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    /// Second factors enrolled for `uid`
    pub fn factors_for(&self, uid: &str) -> Vec<EnrolledFactor> {
        self.lock().factors.get(uid).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn generate_code(&self) -> String {
        match &self.fixed_code {
            Some(code) => code.clone(),
            None => {
                let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
                format!("{:0width$}", n, width = MOCK_CODE_LENGTH)
            }
        }
    }

    fn issue(&self, phone_e164: &str, enrolling_uid: Option<String>) -> Result<ChallengeId, ProviderError> {
        if !is_valid_international_phone(phone_e164) {
            return Err(ProviderError::from_code("INVALID_PHONE_NUMBER"));
        }

        let mut state = self.lock();
        if let Some(err) = state.request_failures.pop_front() {
            tracing::warn!(
                provider = "mock",
                phone = %mask_phone_number(phone_e164),
                error_code = %err.code,
                "Mock provider simulating request failure"
            );
            return Err(err);
        }

        let test_code = state.test_numbers.get(phone_e164).cloned();
        let is_test_number = test_code.is_some();
        let code = test_code.unwrap_or_else(|| self.generate_code());
        let id = format!("mock-session-{}", Uuid::new_v4().simple());

        state.challenges.insert(
            id.clone(),
            IssuedCode {
                phone_e164: phone_e164.to_string(),
                code: code.clone(),
                enrolling_uid,
            },
        );
        state.last_codes.insert(phone_e164.to_string(), code.clone());
        drop(state);

        if !is_test_number {
            let count = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(
                target: "sms_service",
                provider = "mock",
                phone = %mask_phone_number(phone_e164),
                code = %code,
                message_number = count,
                event = "mock_code_sent",
                "Verification code sent (mock)"
            );
        }
        Ok(ChallengeId::new(id))
    }

    /// Check a code, consuming the challenge when it matches
    fn check(&self, challenge: &Challenge, code: &str) -> Result<IssuedCode, ProviderError> {
        let mut state = self.lock();
        if let Some(err) = state.confirm_failures.pop_front() {
            return Err(err);
        }
        if code.is_empty() {
            return Err(ProviderError::from_code("MISSING_CODE"));
        }

        let matches = match state.challenges.get(challenge.id.as_str()) {
            Some(issued) => issued.code == code,
            None => return Err(ProviderError::from_code("INVALID_SESSION_INFO")),
        };
        if !matches {
            return Err(ProviderError::from_code("INVALID_CODE"));
        }

        state
            .challenges
            .remove(challenge.id.as_str())
            .ok_or_else(|| ProviderError::from_code("INVALID_SESSION_INFO"))
    }

    fn uid_for_token(&self, id_token: &str) -> Result<String, ProviderError> {
        self.lock()
            .tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| ProviderError::from_code("INVALID_ID_TOKEN"))
    }
}

impl Default for MockPhoneAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhoneAuthProvider for MockPhoneAuthProvider {
    async fn request_challenge(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError> {
        self.simulate_latency().await;
        self.issue(phone_e164, None)
    }

    async fn confirm_challenge(
        &self,
        challenge: &Challenge,
        code: &str,
    ) -> Result<AuthenticatedIdentity, ProviderError> {
        self.simulate_latency().await;
        let issued = self.check(challenge, code)?;

        let mut state = self.lock();
        let uid = state
            .users
            .entry(issued.phone_e164.clone())
            .or_insert_with(|| format!("mock-uid-{}", Uuid::new_v4().simple()))
            .clone();
        let id_token = format!("mock-id-token-{}", Uuid::new_v4().simple());
        state.tokens.insert(id_token.clone(), uid.clone());

        tracing::info!(
            provider = "mock",
            uid = %uid,
            phone = %mask_phone_number(&issued.phone_e164),
            event = "mock_sign_in",
            "Signed in with phone number (mock)"
        );
        Ok(AuthenticatedIdentity::new(uid, issued.phone_e164, id_token)
            .with_refresh_token(format!("mock-refresh-{}", Uuid::new_v4().simple())))
    }
}

#[async_trait]
impl MultiFactorProvider for MockPhoneAuthProvider {
    async fn get_enrollment_session(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<EnrollmentSession, ProviderError> {
        self.simulate_latency().await;
        self.uid_for_token(&identity.id_token)?;

        let token = format!("mock-mfa-session-{}", Uuid::new_v4().simple());
        self.lock().enrollment_sessions.insert(token.clone());
        Ok(EnrollmentSession::new(token))
    }

    async fn request_enrollment_challenge(
        &self,
        identity: &AuthenticatedIdentity,
        session: &EnrollmentSession,
        phone_e164: &str,
    ) -> Result<ChallengeId, ProviderError> {
        self.simulate_latency().await;
        let uid = self.uid_for_token(&identity.id_token)?;
        if !self.lock().enrollment_sessions.remove(&session.token) {
            return Err(ProviderError::from_code("INVALID_SESSION_INFO"));
        }
        self.issue(phone_e164, Some(uid))
    }

    async fn finalize_enrollment(
        &self,
        identity: &AuthenticatedIdentity,
        challenge: &Challenge,
        code: &str,
        display_name: &str,
    ) -> Result<EnrolledFactor, ProviderError> {
        self.simulate_latency().await;
        let uid = self.uid_for_token(&identity.id_token)?;
        let issued = self.check(challenge, code)?;
        if issued.enrolling_uid.as_deref() != Some(uid.as_str()) {
            return Err(ProviderError::from_code("INVALID_SESSION_INFO"));
        }

        let factor = EnrolledFactor {
            factor_id: Uuid::new_v4().to_string(),
            phone_e164: issued.phone_e164,
            display_name: display_name.to_string(),
            enrolled_at: Utc::now(),
        };
        self.lock()
            .factors
            .entry(uid.clone())
            .or_default()
            .push(factor.clone());

        tracing::info!(
            provider = "mock",
            uid = %uid,
            factor_id = %factor.factor_id,
            event = "mock_factor_enrolled",
            "Second factor enrolled (mock)"
        );
        Ok(factor)
    }
}
