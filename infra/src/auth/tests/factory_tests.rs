//! Tests for provider selection

use ob_core::domain::entities::{Challenge, PhoneNumber};
use ob_core::services::{MultiFactorProvider, PhoneAuthProvider};
use ob_shared::{ProviderConfig, ProviderKind};

use crate::auth::create_phone_auth_provider;

#[test]
fn test_mock_is_selected_by_default() {
    let providers = create_phone_auth_provider(&ProviderConfig::default());
    assert_eq!(providers.kind, ProviderKind::Mock);
}

#[test]
fn test_identity_toolkit_with_api_key() {
    let providers = create_phone_auth_provider(&ProviderConfig::identity_toolkit("key-123"));
    assert_eq!(providers.kind, ProviderKind::IdentityToolkit);
}

#[test]
fn test_missing_api_key_falls_back_to_mock() {
    let config = ProviderConfig {
        kind: ProviderKind::IdentityToolkit,
        api_key: Some("   ".to_string()),
        ..Default::default()
    };
    let providers = create_phone_auth_provider(&config);
    assert_eq!(providers.kind, ProviderKind::Mock);
}

#[tokio::test]
async fn test_configured_fixed_code_is_honoured() {
    let config = ProviderConfig {
        mock_fixed_code: Some("246810".to_string()),
        ..ProviderConfig::mock()
    };
    let providers = create_phone_auth_provider(&config);

    let id = providers.phone_auth.request_challenge("+919876543210").await.unwrap();
    let challenge = Challenge::new(id, PhoneNumber::parse("9876543210").unwrap());
    let identity = providers
        .phone_auth
        .confirm_challenge(&challenge, "246810")
        .await
        .unwrap();

    // The mock's multi-factor half shares its sign-in state
    assert!(providers.multi_factor.get_enrollment_session(&identity).await.is_ok());
}
