//! User details form collected after the phone is verified.

use chrono::{NaiveDate, Utc};
use ob_shared::phone;
use ob_shared::validation::{validators, Validate, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::aadhaar::AadhaarRecord;
use super::phone_number::PhoneNumber;

/// Date formats accepted for the date of birth
const DOB_FORMATS: [&str; 3] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Indian states and union territories accepted in the address
pub const INDIAN_STATES: [&str; 36] = [
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

pub const AADHAAR_MESSAGE: &str = "Enter a valid 12-digit Aadhar number.";
pub const PHONE_MESSAGE: &str = "Enter a valid 10-digit mobile number.";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "Password is required.";
pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be at least 8 characters long, include one uppercase letter, one lowercase letter, one number, and one special character (@$!%*?&).";
pub const CONFIRM_REQUIRED_MESSAGE: &str = "Confirm password is required.";
pub const CONFIRM_MISMATCH_MESSAGE: &str = "Password does not match.";
pub const TERMS_MESSAGE: &str = "You must accept the terms and conditions.";

/// Raw user details as typed into the form
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    /// Date of birth as typed (DD-MM-YYYY, DD/MM/YYYY or YYYY-MM-DD)
    pub dob: String,
    pub email: String,
    /// Verified phone; read-only on the form
    pub phone: String,
    pub aadhar: String,
    pub address: String,
    pub state: String,
    pub nominee_name: String,
    pub nominee_aadhar: String,
    pub nominee_relationship: String,
    pub password: String,
    pub confirm_password: String,
    pub terms_accepted: bool,
}

/// User details that passed validation, normalized
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedProfile {
    pub name: String,
    pub dob: NaiveDate,
    pub email: String,
    pub phone: PhoneNumber,
    /// Twelve digits, grouping removed
    pub aadhaar_number: String,
    pub address: String,
    /// Canonical state name from [`INDIAN_STATES`]
    pub state: String,
    pub nominee_name: String,
    pub nominee_aadhaar: String,
    pub nominee_relationship: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for ProfileForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileForm")
            .field("name", &self.name)
            .field("dob", &self.dob)
            .field("email", &self.email)
            .field("phone", &phone::mask_phone_number(&self.phone))
            .field("state", &self.state)
            .field("terms_accepted", &self.terms_accepted)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ValidatedProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedProfile")
            .field("name", &self.name)
            .field("dob", &self.dob)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ProfileForm {
    /// Start a form with the verified phone filled in
    pub fn for_verified_phone(phone: &PhoneNumber) -> Self {
        Self {
            phone: phone.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Copy the fields an Aadhaar document provides into the form
    pub fn prefill_from_aadhaar(&mut self, record: &AadhaarRecord) {
        self.name = record.name.clone();
        self.dob = record.dob.clone();
        self.aadhar = record.aadhaar_number.clone();
        self.address = record.address.clone();
    }

    /// Validate every field against `today`, collecting all failures
    pub fn validate_at(&self, today: NaiveDate) -> Result<ValidatedProfile, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        require(&mut errors, "name", "Name", &self.name);

        let dob = if !validators::not_empty(&self.dob) {
            errors.add_error("dob", "Date of birth is required.", "required");
            None
        } else {
            match parse_dob(&self.dob) {
                None => {
                    errors.add_error(
                        "dob",
                        "Enter the date of birth as DD-MM-YYYY.",
                        "invalid_format",
                    );
                    None
                }
                Some(date) if date > today => {
                    errors.add_error("dob", "Date of birth cannot be in the future.", "future_date");
                    None
                }
                Some(date) => Some(date),
            }
        };

        if !validators::not_empty(&self.email) {
            errors.add_error("email", "Email is required.", "required");
        } else if !validators::is_valid_email(&self.email) {
            errors.add_error("email", "Enter a valid email address.", "invalid_format");
        }

        let phone = PhoneNumber::parse(&self.phone).ok();
        if phone.is_none() {
            errors.add_error("phone", PHONE_MESSAGE, "invalid_format");
        }

        if !validators::is_valid_aadhaar(&self.aadhar) {
            errors.add_error("aadhar", AADHAAR_MESSAGE, "invalid_format");
        }

        require(&mut errors, "address", "Address", &self.address);

        let state = if !validators::not_empty(&self.state) {
            errors.add_error("state", "State is required.", "required");
            None
        } else {
            let state = canonical_state(&self.state);
            if state.is_none() {
                errors.add_error(
                    "state",
                    "Select a valid Indian state or union territory.",
                    "unknown_state",
                );
            }
            state
        };

        require(&mut errors, "nominee_name", "Nominee name", &self.nominee_name);

        if !validators::is_valid_aadhaar(&self.nominee_aadhar) {
            errors.add_error("nominee_aadhar", AADHAAR_MESSAGE, "invalid_format");
        }

        require(
            &mut errors,
            "nominee_relationship",
            "Nominee relationship",
            &self.nominee_relationship,
        );

        if self.password.is_empty() {
            errors.add_error("password", PASSWORD_REQUIRED_MESSAGE, "required");
        } else if !validators::meets_password_policy(&self.password) {
            errors.add_error("password", PASSWORD_POLICY_MESSAGE, "weak_password");
        }

        if self.confirm_password.is_empty() {
            errors.add_error("confirm_password", CONFIRM_REQUIRED_MESSAGE, "required");
        } else if self.confirm_password != self.password {
            errors.add_error("confirm_password", CONFIRM_MISMATCH_MESSAGE, "mismatch");
        }

        if !self.terms_accepted {
            errors.add_error("terms", TERMS_MESSAGE, "not_accepted");
        }

        match (errors.is_empty(), dob, phone, state) {
            (true, Some(dob), Some(phone), Some(state)) => Ok(ValidatedProfile {
                name: self.name.trim().to_string(),
                dob,
                email: self.email.trim().to_string(),
                phone,
                aadhaar_number: validators::normalize_aadhaar(&self.aadhar),
                address: self.address.trim().to_string(),
                state: state.to_string(),
                nominee_name: self.nominee_name.trim().to_string(),
                nominee_aadhaar: validators::normalize_aadhaar(&self.nominee_aadhar),
                nominee_relationship: self.nominee_relationship.trim().to_string(),
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl Validate for ProfileForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(Utc::now().date_naive()).map(|_| ())
    }
}

fn require(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) {
    if !validators::not_empty(value) {
        errors.add_error(field, format!("{} is required.", label), "required");
    }
}

/// Parse a date of birth in any of the accepted formats
pub fn parse_dob(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DOB_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Match a state name case-insensitively, returning its canonical spelling
pub fn canonical_state(value: &str) -> Option<&'static str> {
    let value = value.trim();
    INDIAN_STATES
        .iter()
        .copied()
        .find(|state| state.eq_ignore_ascii_case(value))
}
