//! Phone verification configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::phone::DEFAULT_COUNTRY_CODE;

/// Settings for the one-time-code flow
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Country calling code combined with every national number
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Number of digits in a one-time code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds before the user may request another code
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u32,

    /// Upper bound on a challenge request round trip
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Age after which an outstanding challenge is treated as expired
    #[serde(default = "default_challenge_max_age")]
    pub challenge_max_age_secs: u64,

    /// Countdown tick period in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            code_length: default_code_length(),
            resend_cooldown_secs: default_resend_cooldown(),
            request_timeout_secs: default_request_timeout(),
            challenge_max_age_secs: default_challenge_max_age(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl VerificationConfig {
    /// Set the resend cooldown in seconds
    pub fn with_resend_cooldown(mut self, secs: u32) -> Self {
        self.resend_cooldown_secs = secs;
        self
    }

    /// Set the challenge request timeout in seconds
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the maximum challenge age in seconds
    pub fn with_challenge_max_age(mut self, secs: u64) -> Self {
        self.challenge_max_age_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn challenge_max_age(&self) -> Duration {
        Duration::from_secs(self.challenge_max_age_secs)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

fn default_country_code() -> String {
    String::from(DEFAULT_COUNTRY_CODE)
}

fn default_code_length() -> usize {
    6
}

fn default_resend_cooldown() -> u32 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

fn default_challenge_max_age() -> u64 {
    300 // 5 minutes
}

fn default_tick_millis() -> u64 {
    1000
}
