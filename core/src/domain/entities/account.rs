//! Returning-user forms: login, forgot-password and new-password.

use ob_shared::validation::{validators, Validate, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::phone_number::PhoneNumber;
use super::profile::{
    CONFIRM_MISMATCH_MESSAGE, CONFIRM_REQUIRED_MESSAGE, PASSWORD_POLICY_MESSAGE,
    PASSWORD_REQUIRED_MESSAGE, PHONE_MESSAGE,
};

pub const PHONE_REQUIRED_MESSAGE: &str = "Mobile number is required.";
pub const RESET_PHONE_MESSAGE: &str = "Please enter a valid mobile number.";

/// Phone and password typed into the login screen
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub phone: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login input after validation
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub phone: PhoneNumber,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("phone", &self.phone.masked())
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn new(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            password: password.into(),
        }
    }

    /// Validate both fields, collecting every failure
    pub fn credentials(&self) -> Result<LoginCredentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let phone = if !validators::not_empty(&self.phone) {
            errors.add_error("phone", PHONE_REQUIRED_MESSAGE, "required");
            None
        } else {
            let parsed = PhoneNumber::parse(&self.phone).ok();
            if parsed.is_none() {
                errors.add_error("phone", PHONE_MESSAGE, "invalid_format");
            }
            parsed
        };

        check_password(&mut errors, &self.password);

        match phone {
            Some(phone) if errors.is_empty() => Ok(LoginCredentials {
                phone,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.credentials().map(|_| ())
    }
}

/// Phone number entered to request a password reset code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordForm {
    pub phone: String,
}

impl ForgotPasswordForm {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
        }
    }

    /// The number the reset code is sent to
    pub fn phone_number(&self) -> Result<PhoneNumber, ValidationErrors> {
        PhoneNumber::parse(&self.phone).map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add_error("phone", RESET_PHONE_MESSAGE, "invalid_format");
            errors
        })
    }
}

impl Validate for ForgotPasswordForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.phone_number().map(|_| ())
    }
}

/// New password chosen after the reset code is verified
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetForm {
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordResetForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordResetForm").finish_non_exhaustive()
    }
}

impl PasswordResetForm {
    pub fn new(password: impl Into<String>, confirm_password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// The accepted new password
    pub fn new_password(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_password(&mut errors, &self.password);

        if self.confirm_password.is_empty() {
            errors.add_error("confirm_password", CONFIRM_REQUIRED_MESSAGE, "required");
        } else if self.confirm_password != self.password {
            errors.add_error("confirm_password", CONFIRM_MISMATCH_MESSAGE, "mismatch");
        }

        if errors.is_empty() {
            Ok(self.password.clone())
        } else {
            Err(errors)
        }
    }
}

impl Validate for PasswordResetForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.new_password().map(|_| ())
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.is_empty() {
        errors.add_error("password", PASSWORD_REQUIRED_MESSAGE, "required");
    } else if !validators::meets_password_policy(password) {
        errors.add_error("password", PASSWORD_POLICY_MESSAGE, "weak_password");
    }
}
