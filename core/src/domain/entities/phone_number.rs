//! National mobile number entity.

use ob_shared::phone::{self, NATIONAL_NUMBER_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::VerificationError;

/// A ten-digit national subscriber number
///
/// Only ever holds exactly ten ASCII digits. The country calling code is
/// attached when the number leaves the process (see [`PhoneNumber::to_e164`]);
/// formatting and masking are display concerns and never stored.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse user input as a national mobile number
    ///
    /// Input containing anything other than digits is rejected rather than
    /// cleaned up; leading and trailing whitespace is the only tolerance.
    pub fn parse(input: &str) -> Result<Self, VerificationError> {
        let trimmed = input.trim();
        if phone::is_valid_national_mobile(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(VerificationError::InvalidPhoneNumber)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full international form, e.g. `+919876543210`
    pub fn to_e164(&self, country_code: &str) -> String {
        phone::to_e164(country_code, &self.0)
    }

    /// Masked form for logs, e.g. `987****3210`
    pub fn masked(&self) -> String {
        phone::mask_phone_number(&self.0)
    }

    /// Grouped form for display, e.g. `+91 98765 43210`
    pub fn display_with(&self, country_code: &str) -> String {
        phone::format_for_display(country_code, &self.0)
            .unwrap_or_else(|| self.to_e164(country_code))
    }

    pub const LENGTH: usize = NATIONAL_NUMBER_LENGTH;
}

impl fmt::Debug for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhoneNumber").field(&self.masked()).finish()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = VerificationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
