//! Identity Toolkit REST Provider
//!
//! Talks to the hosted identity service over its REST API:
//!
//! - `v1/accounts:sendVerificationCode` / `v1/accounts:signInWithPhoneNumber`
//!   for primary sign-in
//! - `v1/accounts:lookup` to check an id token before enrollment
//! - `v2/accounts/mfaEnrollment:start` / `:finalize` for the second factor
//! - `v1/accounts:update` for the profile's display name and email
//!
//! Error bodies look like `{"error": {"code": 400, "message": "INVALID_CODE"}}`;
//! the message is parsed into a [`ProviderErrorCode`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use ob_core::domain::entities::{
    AuthenticatedIdentity, Challenge, ChallengeId, EnrolledFactor, EnrollmentSession,
    ValidatedProfile,
};
use ob_core::errors::{ProviderError, ProviderErrorCode};
use ob_core::services::{MultiFactorProvider, PhoneAuthProvider, ProfileService};
use ob_shared::phone::mask_phone_number;
use ob_shared::ProviderConfig;

use crate::InfrastructureError;

// Request and response bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendVerificationCodeRequest<'a> {
    pub phone_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recaptcha_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendVerificationCodeResponse {
    session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInWithPhoneNumberRequest<'a> {
    pub session_info: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithPhoneNumberResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    local_id: String,
    #[serde(default)]
    phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    mfa_info: Vec<MfaInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MfaInfo {
    mfa_enrollment_id: String,
    #[serde(default)]
    phone_info: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    enrolled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartMfaEnrollmentRequest<'a> {
    pub id_token: &'a str,
    pub phone_enrollment_info: PhoneEnrollmentInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhoneEnrollmentInfo<'a> {
    pub phone_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recaptcha_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartMfaEnrollmentResponse {
    phone_session_info: PhoneSessionInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneSessionInfo {
    session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FinalizeMfaEnrollmentRequest<'a> {
    pub id_token: &'a str,
    pub phone_verification_info: PhoneVerificationInfo<'a>,
    pub display_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhoneVerificationInfo<'a> {
    pub session_info: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeMfaEnrollmentResponse {
    id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    email: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a non-success response body to a [`ProviderError`]
pub(crate) fn parse_error_body(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ProviderError::from_code(&envelope.error.message),
        Err(_) if status >= 500 => {
            ProviderError::unavailable(format!("identity service returned HTTP {}", status))
        }
        Err(_) => ProviderError::new(
            ProviderErrorCode::Unknown(format!("HTTP_{}", status)),
            format!("unexpected response from identity service (HTTP {})", status),
        ),
    }
}

/// Identity Toolkit provider implementation
pub struct IdentityToolkitProvider {
    client: reqwest::Client,
    api_key: String,
    v1_base_url: String,
    v2_base_url: String,
    recaptcha_token: Option<String>,
}

impl IdentityToolkitProvider {
    /// Create a provider from configuration; an API key is required
    pub fn new(config: &ProviderConfig) -> Result<Self, InfrastructureError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(InfrastructureError::MissingApiKey("identity-toolkit"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        tracing::info!(
            v1_base_url = %config.v1_base_url,
            v2_base_url = %config.v2_base_url,
            "Identity Toolkit provider initialized"
        );

        Ok(Self {
            client,
            api_key,
            v1_base_url: config.v1_base_url.trim_end_matches('/').to_string(),
            v2_base_url: config.v2_base_url.trim_end_matches('/').to_string(),
            recaptcha_token: config.recaptcha_token.clone(),
        })
    }

    fn v1(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.v1_base_url, method)
    }

    fn v2(&self, method: &str) -> String {
        format!("{}/accounts/mfaEnrollment:{}", self.v2_base_url, method)
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        tracing::debug!(url = %url, "Identity Toolkit request");

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Identity Toolkit request failed");
                ProviderError::unavailable(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::unavailable(e.to_string()))?;

        if !status.is_success() {
            let err = parse_error_body(status.as_u16(), &text);
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                error_code = %err.code,
                "Identity Toolkit returned an error"
            );
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| {
            ProviderError::new(
                ProviderErrorCode::Unknown("INVALID_RESPONSE".to_string()),
                format!("could not decode identity service response: {}", e),
            )
        })
    }

    async fn lookup(&self, id_token: &str) -> Result<LookupUser, ProviderError> {
        let response: LookupResponse = self
            .post(&self.v1("lookup"), &IdTokenRequest { id_token })
            .await?;
        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::from_code("USER_NOT_FOUND"))
    }
}

#[async_trait]
impl PhoneAuthProvider for IdentityToolkitProvider {
    async fn request_challenge(&self, phone_e164: &str) -> Result<ChallengeId, ProviderError> {
        tracing::info!(
            phone = %mask_phone_number(phone_e164),
            event = "code_requested",
            "Requesting verification code"
        );
        let response: SendVerificationCodeResponse = self
            .post(
                &self.v1("sendVerificationCode"),
                &SendVerificationCodeRequest {
                    phone_number: phone_e164,
                    recaptcha_token: self.recaptcha_token.as_deref(),
                },
            )
            .await?;
        Ok(ChallengeId::new(response.session_info))
    }

    async fn confirm_challenge(
        &self,
        challenge: &Challenge,
        code: &str,
    ) -> Result<AuthenticatedIdentity, ProviderError> {
        let response: SignInWithPhoneNumberResponse = self
            .post(
                &self.v1("signInWithPhoneNumber"),
                &SignInWithPhoneNumberRequest {
                    session_info: challenge.id.as_str(),
                    code,
                },
            )
            .await?;

        let phone = response
            .phone_number
            .unwrap_or_else(|| challenge.phone.to_e164(ob_shared::phone::DEFAULT_COUNTRY_CODE));
        let identity = AuthenticatedIdentity::new(response.local_id, phone, response.id_token);
        Ok(match response.refresh_token {
            Some(token) => identity.with_refresh_token(token),
            None => identity,
        })
    }
}

#[async_trait]
impl MultiFactorProvider for IdentityToolkitProvider {
    async fn get_enrollment_session(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<EnrollmentSession, ProviderError> {
        // The REST API authorizes enrollment with the id token itself, so the
        // session is the token once the service confirms it is still valid
        let user = self.lookup(&identity.id_token).await?;
        if user.local_id != identity.uid {
            return Err(ProviderError::not_authenticated());
        }
        Ok(EnrollmentSession::new(identity.id_token.clone()))
    }

    async fn request_enrollment_challenge(
        &self,
        _identity: &AuthenticatedIdentity,
        session: &EnrollmentSession,
        phone_e164: &str,
    ) -> Result<ChallengeId, ProviderError> {
        let response: StartMfaEnrollmentResponse = self
            .post(
                &self.v2("start"),
                &StartMfaEnrollmentRequest {
                    id_token: &session.token,
                    phone_enrollment_info: PhoneEnrollmentInfo {
                        phone_number: phone_e164,
                        recaptcha_token: self.recaptcha_token.as_deref(),
                    },
                },
            )
            .await?;
        Ok(ChallengeId::new(response.phone_session_info.session_info))
    }

    async fn finalize_enrollment(
        &self,
        identity: &AuthenticatedIdentity,
        challenge: &Challenge,
        code: &str,
        display_name: &str,
    ) -> Result<EnrolledFactor, ProviderError> {
        let response: FinalizeMfaEnrollmentResponse = self
            .post(
                &self.v2("finalize"),
                &FinalizeMfaEnrollmentRequest {
                    id_token: &identity.id_token,
                    phone_verification_info: PhoneVerificationInfo {
                        session_info: challenge.id.as_str(),
                        code,
                    },
                    display_name,
                },
            )
            .await?;

        // Finalize does not echo the enrollment, so read it back
        let user = self.lookup(&response.id_token).await?;
        let info = user
            .mfa_info
            .into_iter()
            .rev()
            .find(|info| {
                info.phone_info
                    .as_deref()
                    .is_some_and(|phone| phone.ends_with(challenge.phone.as_str()))
            })
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorCode::Unknown("MFA_ENROLLMENT_NOT_FOUND".to_string()),
                    "enrolled factor missing from account",
                )
            })?;

        Ok(EnrolledFactor {
            factor_id: info.mfa_enrollment_id,
            phone_e164: info.phone_info.unwrap_or_default(),
            display_name: info.display_name.unwrap_or_else(|| display_name.to_string()),
            enrolled_at: info.enrolled_at.unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl ProfileService for IdentityToolkitProvider {
    async fn save_profile(
        &self,
        identity: &AuthenticatedIdentity,
        profile: &ValidatedProfile,
    ) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .post(
                &self.v1("update"),
                &UpdateAccountRequest {
                    id_token: &identity.id_token,
                    display_name: &profile.name,
                    email: &profile.email,
                    return_secure_token: false,
                },
            )
            .await?;
        Ok(())
    }
}
