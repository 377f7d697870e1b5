//! Authenticated identity and second-factor entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary session established by a confirmed phone challenge
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    /// Provider-side user id
    pub uid: String,
    /// Verified phone in E.164 form
    pub phone_e164: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

impl AuthenticatedIdentity {
    pub fn new(uid: impl Into<String>, phone_e164: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            phone_e164: phone_e164.into(),
            id_token: id_token.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

// Tokens stay out of logs
impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("uid", &self.uid)
            .field("phone_e164", &ob_shared::phone::mask_phone_number(&self.phone_e164))
            .field("id_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Short-lived token authorizing a second-factor enrollment
#[derive(Clone, PartialEq, Eq)]
pub struct EnrollmentSession {
    pub token: String,
}

impl EnrollmentSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for EnrollmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnrollmentSession(<redacted>)")
    }
}

/// Second factor bound to an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledFactor {
    pub factor_id: String,
    pub phone_e164: String,
    pub display_name: String,
    pub enrolled_at: DateTime<Utc>,
}
