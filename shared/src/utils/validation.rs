//! Common validation utilities

use serde::Serialize;
use std::collections::HashMap;

/// Validation failure for a single form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// Collection of validation errors, in the order the fields were checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>, code: impl Into<String>) {
        self.add(FieldError::new(field, message, code));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message recorded for a field
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn to_field_errors(&self) -> HashMap<String, Vec<String>> {
        let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();
        for error in &self.errors {
            field_errors
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        field_errors
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Trait for types that can be validated
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Common validation functions
pub mod validators {
    use once_cell::sync::Lazy;
    use regex::Regex;

    /// Length of an Aadhaar number
    pub const AADHAAR_LENGTH: usize = 12;

    /// Minimum password length
    pub const PASSWORD_MIN_LENGTH: usize = 8;

    /// Symbols accepted (and one required) in passwords
    pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

    static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
    });

    static AADHAAR_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[0-9]{12}$").unwrap()
    });

    /// Check if a string is not empty
    pub fn not_empty(value: &str) -> bool {
        !value.trim().is_empty()
    }

    /// Check if an email address has the usual local@domain.tld shape
    pub fn is_valid_email(email: &str) -> bool {
        EMAIL_REGEX.is_match(email.trim())
    }

    /// Strip the whitespace grouping Aadhaar cards print ("1234 5678 9012")
    pub fn normalize_aadhaar(value: &str) -> String {
        value.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Check if a value is a 12-digit Aadhaar number (grouping spaces allowed)
    pub fn is_valid_aadhaar(value: &str) -> bool {
        AADHAAR_REGEX.is_match(&normalize_aadhaar(value))
    }

    /// Check a password against the sign-up policy
    ///
    /// At least eight characters with one uppercase letter, one lowercase
    /// letter, one digit and one symbol from [`PASSWORD_SYMBOLS`]; no other
    /// characters are accepted.
    pub fn meets_password_policy(password: &str) -> bool {
        let is_symbol = |c: char| PASSWORD_SYMBOLS.contains(c);
        password.chars().count() >= PASSWORD_MIN_LENGTH
            && password.chars().all(|c| c.is_ascii_alphanumeric() || is_symbol(c))
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(is_symbol)
    }
}
