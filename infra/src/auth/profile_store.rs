//! In-memory profile storage

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use ob_core::domain::entities::{AuthenticatedIdentity, ValidatedProfile};
use ob_core::errors::ProviderError;
use ob_core::services::ProfileService;

/// Keeps the last saved profile per user id
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, ValidatedProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &str) -> Option<ValidatedProfile> {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileService for InMemoryProfileStore {
    async fn save_profile(
        &self,
        identity: &AuthenticatedIdentity,
        profile: &ValidatedProfile,
    ) -> Result<(), ProviderError> {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.uid.clone(), profile.clone());
        tracing::debug!(uid = %identity.uid, "Profile stored in memory");
        Ok(())
    }
}
