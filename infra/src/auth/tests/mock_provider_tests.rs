//! Unit tests for the mock phone-auth provider

use std::time::Duration;

use ob_core::domain::entities::{Challenge, PhoneNumber};
use ob_core::errors::ProviderErrorCode;
use ob_core::services::{MultiFactorProvider, PhoneAuthProvider};

use crate::auth::MockPhoneAuthProvider;

const PHONE: &str = "+919876543210";

fn challenge_for(id: ob_core::domain::entities::ChallengeId) -> Challenge {
    Challenge::new(id, PhoneNumber::parse("9876543210").unwrap())
}

#[tokio::test]
async fn test_generated_code_signs_in() {
    let provider = MockPhoneAuthProvider::new();

    let id = provider.request_challenge(PHONE).await.unwrap();
    let code = provider.last_code(PHONE).unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(provider.sent_count(), 1);

    let identity = provider.confirm_challenge(&challenge_for(id), &code).await.unwrap();
    assert_eq!(identity.phone_e164, PHONE);
    assert!(identity.uid.starts_with("mock-uid-"));
    assert!(identity.refresh_token.is_some());
}

#[tokio::test]
async fn test_same_number_keeps_its_uid() {
    let provider = MockPhoneAuthProvider::new().with_fixed_code("123456");

    let first = provider.request_challenge(PHONE).await.unwrap();
    let a = provider.confirm_challenge(&challenge_for(first), "123456").await.unwrap();
    let second = provider.request_challenge(PHONE).await.unwrap();
    let b = provider.confirm_challenge(&challenge_for(second), "123456").await.unwrap();

    assert_eq!(a.uid, b.uid);
    assert_ne!(a.id_token, b.id_token);
}

#[tokio::test]
async fn test_wrong_and_reused_codes() {
    let provider = MockPhoneAuthProvider::new().with_fixed_code("123456");
    let challenge = challenge_for(provider.request_challenge(PHONE).await.unwrap());

    let err = provider.confirm_challenge(&challenge, "654321").await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::InvalidVerificationCode);

    // Still usable after a wrong attempt
    provider.confirm_challenge(&challenge, "123456").await.unwrap();

    // Consumed once confirmed
    let err = provider.confirm_challenge(&challenge, "123456").await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::InvalidSession);
}

#[tokio::test]
async fn test_test_numbers_are_not_sent() {
    let provider = MockPhoneAuthProvider::new().with_test_number("+919999999999", "111111");

    let id = provider.request_challenge("+919999999999").await.unwrap();
    assert_eq!(provider.sent_count(), 0);

    let challenge = Challenge::new(id, PhoneNumber::parse("9999999999").unwrap());
    assert!(provider.confirm_challenge(&challenge, "111111").await.is_ok());
}

#[tokio::test]
async fn test_scripted_failures_are_replayed_once() {
    let provider = MockPhoneAuthProvider::new().with_fixed_code("123456");
    provider.fail_next_request("QUOTA_EXCEEDED");
    provider.fail_next_confirm("SESSION_EXPIRED");

    let err = provider.request_challenge(PHONE).await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::QuotaExceeded);

    let challenge = challenge_for(provider.request_challenge(PHONE).await.unwrap());
    let err = provider.confirm_challenge(&challenge, "123456").await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::SessionExpired);

    assert!(provider.confirm_challenge(&challenge, "123456").await.is_ok());
}

#[tokio::test]
async fn test_rejects_non_e164_numbers() {
    let provider = MockPhoneAuthProvider::new();
    for phone in ["9876543210", "+91abc12345", "+0919876543210"] {
        let err = provider.request_challenge(phone).await.unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::InvalidPhoneNumber, "{}", phone);
    }
    assert_eq!(provider.sent_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_latency_is_simulated() {
    let provider = MockPhoneAuthProvider::new().with_latency(Duration::from_millis(500));
    let started = tokio::time::Instant::now();

    provider.request_challenge(PHONE).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_enrollment_round_trip() {
    let provider = MockPhoneAuthProvider::new().with_fixed_code("123456");
    let identity = provider
        .confirm_challenge(
            &challenge_for(provider.request_challenge(PHONE).await.unwrap()),
            "123456",
        )
        .await
        .unwrap();

    let session = provider.get_enrollment_session(&identity).await.unwrap();
    let id = provider
        .request_enrollment_challenge(&identity, &session, "+919123456780")
        .await
        .unwrap();
    let challenge = Challenge::new(id, PhoneNumber::parse("9123456780").unwrap());

    let factor = provider
        .finalize_enrollment(&identity, &challenge, "123456", "Phone Number")
        .await
        .unwrap();
    assert_eq!(factor.phone_e164, "+919123456780");
    assert_eq!(factor.display_name, "Phone Number");
    assert_eq!(provider.factors_for(&identity.uid), vec![factor]);

    // Sessions are single use
    let err = provider
        .request_enrollment_challenge(&identity, &session, "+919123456780")
        .await
        .unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::InvalidSession);
}

#[tokio::test]
async fn test_enrollment_requires_known_identity() {
    let provider = MockPhoneAuthProvider::new();
    let stranger = ob_core::domain::entities::AuthenticatedIdentity::new("uid", PHONE, "forged");

    let err = provider.get_enrollment_session(&stranger).await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::NotAuthenticated);
}
