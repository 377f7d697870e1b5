//! Phone-auth provider configuration

use serde::{Deserialize, Serialize};

/// Which phone-auth backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// In-memory provider that logs codes instead of sending them
    #[default]
    Mock,
    /// Identity Toolkit REST API
    IdentityToolkit,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "identity-toolkit" | "identity_toolkit" | "firebase" => Ok(ProviderKind::IdentityToolkit),
            _ => Err(format!("Invalid provider: {}", s)),
        }
    }
}

/// Phone-auth provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider implementation
    #[serde(default)]
    pub kind: ProviderKind,

    /// Web API key for the identity project
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for v1 account endpoints
    #[serde(default = "default_v1_base_url")]
    pub v1_base_url: String,

    /// Base URL for v2 multi-factor endpoints
    #[serde(default = "default_v2_base_url")]
    pub v2_base_url: String,

    /// reCAPTCHA token forwarded with code requests, when the project enforces it
    #[serde(default)]
    pub recaptcha_token: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Code the mock provider accepts for every challenge (random when unset)
    #[serde(default)]
    pub mock_fixed_code: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            v1_base_url: default_v1_base_url(),
            v2_base_url: default_v2_base_url(),
            recaptcha_token: None,
            http_timeout_secs: default_http_timeout(),
            mock_fixed_code: None,
        }
    }
}

impl ProviderConfig {
    /// Configuration for the in-memory provider
    pub fn mock() -> Self {
        Self::default()
    }

    /// Configuration for the Identity Toolkit provider
    pub fn identity_toolkit(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::IdentityToolkit,
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }
}

fn default_v1_base_url() -> String {
    String::from("https://identitytoolkit.googleapis.com/v1")
}

fn default_v2_base_url() -> String {
    String::from("https://identitytoolkit.googleapis.com/v2")
}

fn default_http_timeout() -> u64 {
    30
}
