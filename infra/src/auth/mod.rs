//! Phone-auth Provider Module
//!
//! Implementations of the `ob_core` provider traits:
//!
//! - **Mock**: in-memory codes, logged instead of sent, for development and tests
//! - **Identity Toolkit**: REST client for the hosted identity service
//! - **Profile store**: in-memory [`ProfileService`] used alongside the mock

use std::sync::Arc;

use ob_core::services::{MultiFactorProvider, PhoneAuthProvider, ProfileService};
use ob_shared::{ProviderConfig, ProviderKind};

pub mod identity_toolkit;
pub mod mock;
pub mod profile_store;

pub use identity_toolkit::IdentityToolkitProvider;
pub use mock::MockPhoneAuthProvider;
pub use profile_store::InMemoryProfileStore;

#[cfg(test)]
mod tests;

/// Provider handles the signup flow needs, all backed by one implementation
#[derive(Clone)]
pub struct AuthProviders {
    /// Which backend was actually built
    pub kind: ProviderKind,
    pub phone_auth: Arc<dyn PhoneAuthProvider>,
    pub multi_factor: Arc<dyn MultiFactorProvider>,
    pub profiles: Arc<dyn ProfileService>,
}

impl AuthProviders {
    /// Handles backed by a mock provider and an in-memory profile store
    pub fn mock(provider: Arc<MockPhoneAuthProvider>) -> Self {
        Self {
            kind: ProviderKind::Mock,
            phone_auth: provider.clone(),
            multi_factor: provider,
            profiles: Arc::new(InMemoryProfileStore::new()),
        }
    }

    /// Handles backed by the Identity Toolkit REST API
    pub fn identity_toolkit(provider: Arc<IdentityToolkitProvider>) -> Self {
        Self {
            kind: ProviderKind::IdentityToolkit,
            phone_auth: provider.clone(),
            multi_factor: provider.clone(),
            profiles: provider,
        }
    }
}

/// Create the phone-auth providers based on configuration
///
/// Falls back to the mock provider when the configured backend cannot be
/// built (e.g., a missing API key), logging a warning.
pub fn create_phone_auth_provider(config: &ProviderConfig) -> AuthProviders {
    match config.kind {
        ProviderKind::Mock => {
            tracing::info!(provider = "mock", "Using mock phone-auth provider");
            AuthProviders::mock(Arc::new(MockPhoneAuthProvider::from_config(config)))
        }
        ProviderKind::IdentityToolkit => match IdentityToolkitProvider::new(config) {
            Ok(provider) => {
                tracing::info!(provider = "identity-toolkit", "Using Identity Toolkit provider");
                AuthProviders::identity_toolkit(Arc::new(provider))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize Identity Toolkit provider");
                tracing::warn!("Falling back to mock phone-auth provider");
                AuthProviders::mock(Arc::new(MockPhoneAuthProvider::from_config(config)))
            }
        },
    }
}
