//! Unit tests for the signup state machine

use std::sync::Arc;
use std::time::Duration;

use ob_shared::VerificationConfig;
use tokio::sync::broadcast::error::TryRecvError;

use crate::domain::entities::challenge::ChallengeStatus;
use crate::domain::entities::profile::ProfileForm;
use crate::domain::entities::signup::{MfaStatus, SignupEvent, SignupState, SignupStep};
use crate::errors::{RecoveryAction, SignupError, VerificationError};
use crate::services::signup::{SignupAction, SignupStateMachine};
use crate::services::verification::tests::mocks::{
    MockPhoneAuth, MockProfileService, TEST_CODE, TEST_PHONE,
};
use crate::services::verification::ResendOutcome;

struct Fixture {
    provider: Arc<MockPhoneAuth>,
    profiles: Arc<MockProfileService>,
    machine: SignupStateMachine,
}

fn fixture(with_mfa: bool, profile_fails: bool) -> Fixture {
    let provider = Arc::new(MockPhoneAuth::new());
    let profiles = Arc::new(MockProfileService::new(profile_fails));
    let mut machine = SignupStateMachine::new(
        provider.clone(),
        profiles.clone(),
        VerificationConfig::default(),
    );
    if with_mfa {
        machine = machine.with_mfa(provider.clone());
    }
    Fixture {
        provider,
        profiles,
        machine,
    }
}

fn valid_form() -> ProfileForm {
    ProfileForm {
        name: "Asha Verma".to_string(),
        dob: "15-08-1995".to_string(),
        email: "asha@example.com".to_string(),
        phone: String::new(),
        aadhar: "123456789012".to_string(),
        address: "12 MG Road, Pune".to_string(),
        state: "Maharashtra".to_string(),
        nominee_name: "Ravi Verma".to_string(),
        nominee_aadhar: "234567890123".to_string(),
        nominee_relationship: "Brother".to_string(),
        password: "Abc123!@".to_string(),
        confirm_password: "Abc123!@".to_string(),
        terms_accepted: true,
    }
}

async fn reach_user_details(f: &Fixture) {
    f.machine.submit_phone(TEST_PHONE).await.unwrap();
    f.machine.submit_code(TEST_CODE).await.unwrap();
}

#[tokio::test]
async fn test_happy_path_without_mfa() {
    let f = fixture(false, false);
    let mut events = f.machine.subscribe();
    assert_eq!(f.machine.step(), SignupStep::PhoneInput);
    assert!(!f.machine.offers_mfa());

    let challenge = f.machine.submit_phone(TEST_PHONE).await.unwrap();
    assert_eq!(
        f.machine.state(),
        SignupState::OtpVerification {
            challenge: challenge.clone()
        }
    );
    assert_eq!(f.machine.resend_remaining(), 30);

    let verified = f.machine.submit_code(TEST_CODE).await.unwrap();
    assert_eq!(verified.as_str(), TEST_PHONE);
    assert_eq!(
        f.machine.state(),
        SignupState::UserDetails {
            verified_phone: verified.clone()
        }
    );
    assert_eq!(f.machine.identity().unwrap().phone_e164, "+919876543210");

    let step = f.machine.submit_profile(valid_form()).await.unwrap();
    assert_eq!(step, SignupStep::Completed);
    assert_eq!(f.profiles.saved_count(), 1);

    let SignupState::Completed { completion } = f.machine.state() else {
        panic!("expected completed state");
    };
    assert_eq!(completion.verified_phone, verified);
    assert_eq!(completion.mfa, MfaStatus::NotOffered);

    let mut steps = Vec::new();
    loop {
        match events.try_recv() {
            Ok(SignupEvent::StepChanged { to, .. }) => steps.push(to),
            Ok(SignupEvent::Completed(done)) => {
                assert_eq!(done, completion);
                break;
            }
            Err(err) => panic!("missing completion event: {err:?}"),
        }
    }
    assert_eq!(
        steps,
        vec![
            SignupStep::OtpVerification,
            SignupStep::UserDetails,
            SignupStep::Completed
        ]
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_invalid_phone_stays_on_phone_input() {
    let f = fixture(false, false);

    let err = f.machine.submit_phone("98765 43210").await.unwrap_err();
    assert_eq!(err, SignupError::Verification(VerificationError::InvalidPhoneNumber));
    assert_eq!(f.machine.step(), SignupStep::PhoneInput);
    assert_eq!(f.provider.requests(), 0);

    let notice = f.machine.last_error().unwrap();
    assert_eq!(notice.code, "INVALID_PHONE_NUMBER");
    assert_eq!(notice.recovery, RecoveryAction::ChangeNumber);
    assert!(!f.machine.is_loading(SignupAction::SubmitPhone));
}

#[tokio::test]
async fn test_wrong_code_stays_on_verification() {
    let f = fixture(false, false);
    f.machine.submit_phone(TEST_PHONE).await.unwrap();
    for digit in "000000".chars() {
        f.machine.type_digit(digit);
    }

    let err = f.machine.submit_code("000000").await.unwrap_err();
    assert_eq!(err, SignupError::Verification(VerificationError::InvalidCode));
    assert_eq!(f.machine.step(), SignupStep::OtpVerification);
    assert!(f.machine.code_input().is_empty());
    assert_eq!(f.machine.last_error().unwrap().message, "Invalid verification code");

    let SignupState::OtpVerification { challenge } = f.machine.state() else {
        panic!("expected OTP step");
    };
    assert_eq!(challenge.status, ChallengeStatus::Failed);

    f.machine.submit_code(TEST_CODE).await.unwrap();
    assert_eq!(f.machine.step(), SignupStep::UserDetails);
    assert!(f.machine.last_error().is_none());
}

#[tokio::test]
async fn test_actions_outside_their_step_are_rejected() {
    let f = fixture(true, false);

    let err = f.machine.submit_code(TEST_CODE).await.unwrap_err();
    assert_eq!(
        err,
        SignupError::InvalidTransition {
            action: "submit a code",
            step: SignupStep::PhoneInput
        }
    );
    assert_eq!(f.machine.last_error().unwrap().code, "INVALID_TRANSITION");

    assert!(f.machine.go_back().is_err());
    assert!(f.machine.skip_mfa().is_err());
    assert!(f.machine.submit_profile(valid_form()).await.is_err());
    assert!(f.machine.enroll_mfa(TEST_PHONE).await.is_err());
    assert_eq!(f.machine.step(), SignupStep::PhoneInput);
    assert_eq!(f.provider.requests(), 0);
}

#[tokio::test]
async fn test_go_back_cancels_session() {
    let f = fixture(false, false);
    f.machine.submit_phone(TEST_PHONE).await.unwrap();

    f.machine.go_back().unwrap();
    assert_eq!(f.machine.step(), SignupStep::PhoneInput);
    assert_eq!(f.machine.resend_remaining(), 0);
    assert!(!f.machine.can_resend());

    f.machine.submit_phone("9123456780").await.unwrap();
    assert_eq!(f.provider.requests(), 2);
    assert_eq!(f.machine.resend_remaining(), 30);
}

#[tokio::test(start_paused = true)]
async fn test_resend_respects_cooldown() {
    let f = fixture(false, false);
    let first = f.machine.submit_phone(TEST_PHONE).await.unwrap();

    let outcome = f.machine.resend().await.unwrap();
    assert_eq!(outcome, ResendOutcome::CoolingDown { remaining: 30 });
    assert_eq!(f.provider.requests(), 1);
    assert!(!f.machine.can_resend());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(f.machine.resend_remaining(), 0);
    assert!(f.machine.can_resend());

    let ResendOutcome::Resent(second) = f.machine.resend().await.unwrap() else {
        panic!("expected a new challenge");
    };
    assert_ne!(second.id, first.id);
    assert_eq!(
        f.machine.state(),
        SignupState::OtpVerification { challenge: second }
    );
}

#[tokio::test]
async fn test_invalid_profile_blocks_and_reports_fields() {
    let f = fixture(false, false);
    reach_user_details(&f).await;

    let form = ProfileForm {
        aadhar: "12345".to_string(),
        ..valid_form()
    };
    let err = f.machine.submit_profile(form).await.unwrap_err();
    let SignupError::InvalidProfile(errors) = err else {
        panic!("expected field errors");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.message_for("aadhar"),
        Some("Enter a valid 12-digit Aadhar number.")
    );
    assert_eq!(f.machine.step(), SignupStep::UserDetails);
    assert_eq!(f.profiles.saved_count(), 0);
    assert_eq!(f.machine.last_error().unwrap().recovery, RecoveryAction::FixInput);
}

#[tokio::test]
async fn test_profile_phone_comes_from_verified_number() {
    let f = fixture(false, false);
    reach_user_details(&f).await;

    let form = ProfileForm {
        phone: "1111111111".to_string(),
        ..valid_form()
    };
    f.machine.submit_profile(form).await.unwrap();

    let saved = f.profiles.saved.lock().unwrap();
    assert_eq!(saved[0].1.phone.as_str(), TEST_PHONE);
}

#[tokio::test]
async fn test_profile_save_failure_stays_on_details() {
    let f = fixture(false, true);
    reach_user_details(&f).await;

    let err = f.machine.submit_profile(valid_form()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to update user details. Please try again."
    );
    assert_eq!(f.machine.step(), SignupStep::UserDetails);
    assert!(!f.machine.is_busy());
}

#[tokio::test]
async fn test_mfa_enrollment_completes_signup() {
    let f = fixture(true, false);
    reach_user_details(&f).await;
    let mut events = f.machine.subscribe();

    assert!(f.machine.offers_mfa());
    let step = f.machine.submit_profile(valid_form()).await.unwrap();
    assert_eq!(step, SignupStep::MfaSetup);
    assert_eq!(
        f.machine.state(),
        SignupState::MfaSetup {
            enrollment_challenge: None
        }
    );

    let challenge = f.machine.enroll_mfa("9123456780").await.unwrap();
    assert_eq!(
        f.machine.state(),
        SignupState::MfaSetup {
            enrollment_challenge: Some(challenge)
        }
    );
    assert_eq!(f.machine.resend_remaining(), 30);

    let completion = f.machine.confirm_mfa(TEST_CODE).await.unwrap();
    let MfaStatus::Enrolled { factor } = &completion.mfa else {
        panic!("expected an enrolled factor");
    };
    assert_eq!(factor.phone_e164, "+919123456780");
    assert_eq!(factor.display_name, "Phone Number");
    assert_eq!(f.machine.step(), SignupStep::Completed);

    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        if let SignupEvent::Completed(done) = event {
            completed = Some(done);
        }
    }
    assert_eq!(completed, Some(completion));
}

#[tokio::test]
async fn test_skip_mfa() {
    let f = fixture(true, false);
    reach_user_details(&f).await;
    f.machine.submit_profile(valid_form()).await.unwrap();

    let completion = f.machine.skip_mfa().unwrap();
    assert_eq!(completion.mfa, MfaStatus::Skipped);
    assert_eq!(completion.verified_phone.as_str(), TEST_PHONE);
    assert_eq!(f.machine.step(), SignupStep::Completed);
}

#[tokio::test]
async fn test_skip_mfa_is_busy_while_confirm_in_flight() {
    let f = fixture(true, false);
    reach_user_details(&f).await;
    f.machine.submit_profile(valid_form()).await.unwrap();
    f.machine.enroll_mfa("9123456780").await.unwrap();
    let gate = f.provider.gate_confirms();

    let (confirmed, skipped) = tokio::join!(f.machine.confirm_mfa(TEST_CODE), async {
        tokio::task::yield_now().await;
        assert!(f.machine.is_loading(SignupAction::ConfirmMfa));
        let skipped = f.machine.skip_mfa();
        gate.notify_one();
        skipped
    });

    assert_eq!(skipped.unwrap_err(), SignupError::Busy);
    let completion = confirmed.unwrap();
    assert!(matches!(completion.mfa, MfaStatus::Enrolled { .. }));
    let SignupState::Completed { completion: recorded } = f.machine.state() else {
        panic!("expected completed state");
    };
    assert_eq!(recorded, completion);
}

#[tokio::test]
async fn test_confirm_mfa_without_enrollment_challenge() {
    let f = fixture(true, false);
    reach_user_details(&f).await;
    f.machine.submit_profile(valid_form()).await.unwrap();

    let err = f.machine.confirm_mfa(TEST_CODE).await.unwrap_err();
    assert_eq!(
        err,
        SignupError::Verification(VerificationError::NoActiveChallenge)
    );
    assert_eq!(f.machine.step(), SignupStep::MfaSetup);
}

#[tokio::test]
async fn test_mfa_session_failure_maps_to_not_authenticated() {
    let f = fixture(true, false);
    reach_user_details(&f).await;
    f.machine.submit_profile(valid_form()).await.unwrap();
    f.provider
        .fail_enrollment_session(crate::errors::ProviderErrorCode::NotAuthenticated);

    let err = f.machine.enroll_mfa("9123456780").await.unwrap_err();
    assert_eq!(err, SignupError::Verification(VerificationError::NotAuthenticated));
    let notice = f.machine.last_error().unwrap();
    assert_eq!(notice.message, "User not authenticated");
    assert_eq!(notice.recovery, RecoveryAction::SignInAgain);
}

#[tokio::test]
async fn test_reentrant_submit_is_busy() {
    let f = fixture(false, false);
    f.machine.submit_phone(TEST_PHONE).await.unwrap();
    let gate = f.provider.gate_confirms();

    let (first, second) = tokio::join!(f.machine.submit_code(TEST_CODE), async {
        tokio::task::yield_now().await;
        assert!(f.machine.is_loading(SignupAction::SubmitCode));
        let second = f.machine.submit_code(TEST_CODE).await;
        gate.notify_one();
        second
    });

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), SignupError::Busy);
    assert!(!f.machine.is_busy());
    assert_eq!(f.machine.step(), SignupStep::UserDetails);
}

#[tokio::test]
async fn test_go_back_discards_in_flight_code() {
    let f = fixture(false, false);
    f.machine.submit_phone(TEST_PHONE).await.unwrap();
    let gate = f.provider.gate_confirms();

    let (submitted, _) = tokio::join!(f.machine.submit_code(TEST_CODE), async {
        tokio::task::yield_now().await;
        f.machine.go_back().unwrap();
        gate.notify_one();
    });

    assert_eq!(
        submitted.unwrap_err(),
        SignupError::Verification(VerificationError::Superseded)
    );
    assert_eq!(f.machine.step(), SignupStep::PhoneInput);
    assert!(f.machine.last_error().is_none());
    assert!(f.machine.identity().is_none());
}
