//! Verification challenge entity: one outstanding code request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use super::phone_number::PhoneNumber;

/// Opaque handle the provider issues for a code request
///
/// Passed back verbatim when confirming a code against that request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(String);

impl ChallengeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Code sent, awaiting submission
    Pending,
    /// Code accepted; terminal
    Confirmed,
    /// Provider reported expiry or the maximum age elapsed; a new code is needed
    Expired,
    /// Last submission was rejected; another code may still be submitted
    Failed,
}

/// One outstanding verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub id: ChallengeId,
    pub phone: PhoneNumber,
    /// Wall-clock issue time, for display
    pub issued_at: DateTime<Utc>,
    pub status: ChallengeStatus,
    /// Monotonic issue time, for age checks
    issued: Instant,
}

impl Challenge {
    pub fn new(id: ChallengeId, phone: PhoneNumber) -> Self {
        Self {
            id,
            phone,
            issued_at: Utc::now(),
            status: ChallengeStatus::Pending,
            issued: Instant::now(),
        }
    }

    /// Whether a code may still be submitted against this challenge
    pub fn is_resubmittable(&self) -> bool {
        matches!(self.status, ChallengeStatus::Pending | ChallengeStatus::Failed)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ChallengeStatus::Confirmed
    }

    pub fn age(&self) -> Duration {
        self.issued.elapsed()
    }

    /// Check if the challenge has outlived `max_age`
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }

    pub fn mark_confirmed(&mut self) {
        self.status = ChallengeStatus::Confirmed;
    }

    pub fn mark_failed(&mut self) {
        self.status = ChallengeStatus::Failed;
    }

    pub fn mark_expired(&mut self) {
        self.status = ChallengeStatus::Expired;
    }
}
