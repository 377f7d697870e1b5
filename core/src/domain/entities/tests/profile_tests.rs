//! Unit tests for profile form validation

use chrono::NaiveDate;

use crate::domain::entities::aadhaar::AadhaarRecord;
use crate::domain::entities::phone_number::PhoneNumber;
use crate::domain::entities::profile::{
    canonical_state, parse_dob, ProfileForm, AADHAAR_MESSAGE, CONFIRM_MISMATCH_MESSAGE,
    PASSWORD_POLICY_MESSAGE,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn valid_form() -> ProfileForm {
    ProfileForm {
        name: "Asha Verma".to_string(),
        dob: "15-08-1995".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        aadhar: "1234 5678 9012".to_string(),
        address: "12 MG Road, Pune".to_string(),
        state: "maharashtra".to_string(),
        nominee_name: "Ravi Verma".to_string(),
        nominee_aadhar: "234567890123".to_string(),
        nominee_relationship: "Brother".to_string(),
        password: "Abc123!@".to_string(),
        confirm_password: "Abc123!@".to_string(),
        terms_accepted: true,
    }
}

#[test]
fn test_valid_form_is_normalized() {
    let profile = valid_form().validate_at(today()).unwrap();
    assert_eq!(profile.dob, NaiveDate::from_ymd_opt(1995, 8, 15).unwrap());
    assert_eq!(profile.aadhaar_number, "123456789012");
    assert_eq!(profile.state, "Maharashtra");
    assert_eq!(profile.phone.as_str(), "9876543210");
}

#[test]
fn test_empty_form_reports_every_field() {
    let errors = ProfileForm::default().validate_at(today()).unwrap_err();

    for field in [
        "name",
        "dob",
        "email",
        "phone",
        "aadhar",
        "address",
        "state",
        "nominee_name",
        "nominee_aadhar",
        "nominee_relationship",
        "password",
        "confirm_password",
        "terms",
    ] {
        assert!(errors.contains(field), "missing error for {field}");
    }
    assert_eq!(errors.message_for("name"), Some("Name is required."));
    assert_eq!(errors.message_for("password"), Some("Password is required."));
    assert_eq!(
        errors.message_for("confirm_password"),
        Some("Confirm password is required.")
    );
    assert_eq!(
        errors.message_for("phone"),
        Some("Enter a valid 10-digit mobile number.")
    );
}

#[test]
fn test_short_aadhaar_is_rejected() {
    let form = ProfileForm {
        aadhar: "12345".to_string(),
        ..valid_form()
    };
    let errors = form.validate_at(today()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.message_for("aadhar"), Some(AADHAAR_MESSAGE));
    assert_eq!(AADHAAR_MESSAGE, "Enter a valid 12-digit Aadhar number.");
}

#[test]
fn test_nominee_aadhaar_uses_same_rule() {
    let form = ProfileForm {
        nominee_aadhar: "1234567890ab".to_string(),
        ..valid_form()
    };
    let errors = form.validate_at(today()).unwrap_err();
    assert_eq!(errors.message_for("nominee_aadhar"), Some(AADHAAR_MESSAGE));
}

#[test]
fn test_password_policy() {
    let weak = ProfileForm {
        password: "abc12345".to_string(),
        confirm_password: "abc12345".to_string(),
        ..valid_form()
    };
    let errors = weak.validate_at(today()).unwrap_err();
    assert_eq!(errors.message_for("password"), Some(PASSWORD_POLICY_MESSAGE));
    assert!(!errors.contains("confirm_password"));

    let strong = ProfileForm {
        password: "Abc123!@".to_string(),
        confirm_password: "Abc123!@".to_string(),
        ..valid_form()
    };
    assert!(strong.validate_at(today()).is_ok());
}

#[test]
fn test_password_mismatch() {
    let form = ProfileForm {
        confirm_password: "Abc123!#".to_string(),
        ..valid_form()
    };
    let errors = form.validate_at(today()).unwrap_err();
    assert_eq!(
        errors.message_for("confirm_password"),
        Some(CONFIRM_MISMATCH_MESSAGE)
    );
}

#[test]
fn test_dob_formats_and_future_dates() {
    assert!(parse_dob("15-08-1995").is_some());
    assert!(parse_dob("15/08/1995").is_some());
    assert!(parse_dob("1995-08-15").is_some());
    assert!(parse_dob("August 15 1995").is_none());
    assert!(parse_dob("31-02-1995").is_none());

    let future = ProfileForm {
        dob: "02-06-2024".to_string(),
        ..valid_form()
    };
    let errors = future.validate_at(today()).unwrap_err();
    assert_eq!(
        errors.message_for("dob"),
        Some("Date of birth cannot be in the future.")
    );

    let born_today = ProfileForm {
        dob: "2024-06-01".to_string(),
        ..valid_form()
    };
    assert!(born_today.validate_at(today()).is_ok());
}

#[test]
fn test_email_and_state_formats() {
    let form = ProfileForm {
        email: "asha@example".to_string(),
        state: "Atlantis".to_string(),
        ..valid_form()
    };
    let errors = form.validate_at(today()).unwrap_err();
    assert_eq!(errors.message_for("email"), Some("Enter a valid email address."));
    assert!(errors.contains("state"));

    assert_eq!(canonical_state(" tamil nadu "), Some("Tamil Nadu"));
    assert_eq!(canonical_state("Delhi"), Some("Delhi"));
}

#[test]
fn test_terms_must_be_accepted() {
    let form = ProfileForm {
        terms_accepted: false,
        ..valid_form()
    };
    let errors = form.validate_at(today()).unwrap_err();
    assert_eq!(
        errors.message_for("terms"),
        Some("You must accept the terms and conditions.")
    );
}

#[test]
fn test_prefill_from_aadhaar() {
    let phone = PhoneNumber::parse("9876543210").unwrap();
    let mut form = ProfileForm::for_verified_phone(&phone);
    form.prefill_from_aadhaar(&AadhaarRecord {
        name: "Rahul".to_string(),
        dob: "15-08-1995".to_string(),
        aadhaar_number: "123454589012".to_string(),
        address: "123, Green Park, New Delhi, India".to_string(),
    });

    assert_eq!(form.phone, "9876543210");
    assert_eq!(form.name, "Rahul");
    assert_eq!(form.dob, "15-08-1995");
    assert_eq!(form.aadhar, "123454589012");
    assert_eq!(form.address, "123, Green Park, New Delhi, India");
    assert!(form.email.is_empty());
}
