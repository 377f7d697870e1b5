//! Mock providers for testing verification, enrollment and signup

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::domain::entities::challenge::{Challenge, ChallengeId};
use crate::domain::entities::identity::{AuthenticatedIdentity, EnrolledFactor, EnrollmentSession};
use crate::domain::entities::profile::ValidatedProfile;
use crate::errors::{ProviderError, ProviderErrorCode};
use crate::services::verification::traits::{MultiFactorProvider, PhoneAuthProvider, ProfileService};

pub const TEST_CODE: &str = "123456";
pub const TEST_PHONE: &str = "9876543210";

/// Phone-auth provider that accepts [`TEST_CODE`] for every challenge
pub struct MockPhoneAuth {
    /// challenge id -> phone it was sent to
    pub issued: Arc<Mutex<HashMap<String, String>>>,
    pub request_failures: Mutex<VecDeque<ProviderError>>,
    pub confirm_failures: Mutex<VecDeque<ProviderError>>,
    pub session_failure: Mutex<Option<ProviderError>>,
    pub request_delay: Mutex<Option<Duration>>,
    pub confirm_gate: Mutex<Option<Arc<Notify>>>,
    pub request_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub enrollment_requests: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockPhoneAuth {
    pub fn new() -> Self {
        Self {
            issued: Arc::new(Mutex::new(HashMap::new())),
            request_failures: Mutex::new(VecDeque::new()),
            confirm_failures: Mutex::new(VecDeque::new()),
            session_failure: Mutex::new(None),
            request_delay: Mutex::new(None),
            confirm_gate: Mutex::new(None),
            request_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            enrollment_requests: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Fail the next code request with `code`
    pub fn fail_next_request(&self, code: ProviderErrorCode) {
        self.request_failures
            .lock()
            .unwrap()
            .push_back(ProviderError::new(code, "scripted failure"));
    }

    /// Fail the next confirmation with `code`
    pub fn fail_next_confirm(&self, code: ProviderErrorCode) {
        self.confirm_failures
            .lock()
            .unwrap()
            .push_back(ProviderError::new(code, "scripted failure"));
    }

    pub fn fail_enrollment_session(&self, code: ProviderErrorCode) {
        *self.session_failure.lock().unwrap() = Some(ProviderError::new(code, "scripted failure"));
    }

    pub fn delay_requests(&self, delay: Duration) {
        *self.request_delay.lock().unwrap() = Some(delay);
    }

    /// Hold confirmations until the returned handle is notified
    pub fn gate_confirms(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.confirm_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn requests(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn confirms(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn last_phone(&self) -> Option<String> {
        let issued = self.issued.lock().unwrap();
        let latest = self.next_id.load(Ordering::SeqCst) - 1;
        issued.get(&format!("challenge-{}", latest)).cloned()
    }

    async fn issue(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.request_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.request_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let id = format!("challenge-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.issued
            .lock()
            .unwrap()
            .insert(id.clone(), phone_e164.to_string());
        Ok(ChallengeId::new(id))
    }

    async fn check(&self, challenge: &Challenge, code: &str) -> Result<String, ProviderError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.confirm_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.confirm_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let phone = self
            .issued
            .lock()
            .unwrap()
            .get(challenge.id.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::from_code("INVALID_SESSION_INFO"))?;
        if code != TEST_CODE {
            return Err(ProviderError::from_code("auth/invalid-verification-code"));
        }
        Ok(phone)
    }
}

#[async_trait]
impl PhoneAuthProvider for MockPhoneAuth {
    async fn request_challenge(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError> {
        self.issue(phone_e164).await
    }

    async fn confirm_challenge(
        &self,
        challenge: &Challenge,
        code: &str,
    ) -> Result<AuthenticatedIdentity, ProviderError> {
        let phone = self.check(challenge, code).await?;
        Ok(AuthenticatedIdentity::new(
            format!("uid-{}", phone),
            phone,
            "id-token",
        ))
    }
}

#[async_trait]
impl MultiFactorProvider for MockPhoneAuth {
    async fn get_enrollment_session(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<EnrollmentSession, ProviderError> {
        if let Some(err) = self.session_failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(EnrollmentSession::new(format!("mfa-session-{}", identity.uid)))
    }

    async fn request_enrollment_challenge(
        &self,
        _identity: &AuthenticatedIdentity,
        _session: &EnrollmentSession,
        phone_e164: &str,
    ) -> Result<ChallengeId, ProviderError> {
        self.enrollment_requests.fetch_add(1, Ordering::SeqCst);
        self.issue(phone_e164).await
    }

    async fn finalize_enrollment(
        &self,
        _identity: &AuthenticatedIdentity,
        challenge: &Challenge,
        code: &str,
        display_name: &str,
    ) -> Result<EnrolledFactor, ProviderError> {
        let phone = self.check(challenge, code).await?;
        Ok(EnrolledFactor {
            factor_id: format!("factor-{}", challenge.id),
            phone_e164: phone,
            display_name: display_name.to_string(),
            enrolled_at: Utc::now(),
        })
    }
}

/// Profile store recording what was saved
pub struct MockProfileService {
    pub saved: Arc<Mutex<Vec<(String, ValidatedProfile)>>>,
    pub should_fail: bool,
}

impl MockProfileService {
    pub fn new(should_fail: bool) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            should_fail,
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileService for MockProfileService {
    async fn save_profile(
        &self,
        identity: &AuthenticatedIdentity,
        profile: &ValidatedProfile,
    ) -> Result<(), ProviderError> {
        if self.should_fail {
            return Err(ProviderError::unavailable("profile store error"));
        }
        self.saved
            .lock()
            .unwrap()
            .push((identity.uid.clone(), profile.clone()));
        Ok(())
    }
}
