//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Number of digits in a national subscriber number
pub const NATIONAL_NUMBER_LENGTH: usize = 10;

/// Country calling code prepended before a number leaves the device
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

// National mobile number: exactly ten ASCII digits, nothing else
static NATIONAL_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{10}$").unwrap()
});

// Country calling code such as +91 or +1
static COUNTRY_CODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9][0-9]{0,3}$").unwrap()
});

// International phone number regex (E.164 format)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{1,14}$").unwrap()
});

/// Drop every non-digit character from keyboard input, capped at ten digits.
///
/// This is the keystroke filter for the phone field; it is never applied to a
/// number that is about to be validated.
pub fn sanitize_phone_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(NATIONAL_NUMBER_LENGTH)
        .collect()
}

/// Check if a string is a ten-digit national mobile number
pub fn is_valid_national_mobile(phone: &str) -> bool {
    NATIONAL_MOBILE_REGEX.is_match(phone)
}

/// Check if a string is a usable country calling code
pub fn is_valid_country_code(code: &str) -> bool {
    COUNTRY_CODE_REGEX.is_match(code)
}

/// Check if a phone number is valid (international E.164 format)
pub fn is_valid_international_phone(phone: &str) -> bool {
    INTERNATIONAL_PHONE_REGEX.is_match(phone)
}

/// Combine a country code and a national number into E.164 form
pub fn to_e164(country_code: &str, national: &str) -> String {
    format!("{}{}", country_code, national)
}

/// Format a national number for display (e.g., +91 98765 43210)
pub fn format_for_display(country_code: &str, national: &str) -> Option<String> {
    if is_valid_national_mobile(national) {
        Some(format!("{} {} {}", country_code, &national[0..5], &national[5..10]))
    } else {
        None
    }
}

/// Mask a phone number for display and logs (e.g., 987****3210)
pub fn mask_phone_number(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().collect();
    if digits.len() >= 7 {
        let head: String = digits[..3].iter().collect();
        let tail: String = digits[digits.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}
