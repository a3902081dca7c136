//! User profiles and the onboarding submission sink.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("user not found: {0}")]
    NotFound(u64),

    #[error("profile store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile data malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A user record, as returned after onboarding submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub ott: Vec<String>,
    #[serde(default)]
    pub liked_genres: Vec<String>,
    #[serde(default)]
    pub preference_vector: Vec<u8>,
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl UserProfile {
    pub fn new(id: u64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            ott: Vec::new(),
            liked_genres: Vec::new(),
            preference_vector: Vec::new(),
            onboarding_completed: false,
        }
    }
}

/// Profile lookup and onboarding persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: u64) -> Result<Option<UserProfile>, ProfileError>;

    /// Persist the onboarding result and return the updated user. Unknown
    /// users fail with [`ProfileError::NotFound`] and mutate nothing.
    async fn complete_onboarding(
        &self,
        user_id: u64,
        ott: Vec<String>,
        liked_genres: Vec<String>,
        preference_vector: Vec<u8>,
    ) -> Result<UserProfile, ProfileError>;
}

/// In-memory implementation of [`ProfileStore`].
#[derive(Default)]
pub struct InMemoryProfileStore {
    users: DashMap<u64, UserProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.id, profile);
    }

    /// Seed users from a JSON file holding an array of profiles.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path)?;
        let profiles: Vec<UserProfile> = serde_json::from_str(&raw)?;
        let store = Self::new();
        for profile in profiles {
            store.insert(profile);
        }
        info!(users = store.users.len(), "seeded profile store");
        Ok(store)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: u64) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self.users.get(&user_id).map(|entry| entry.clone()))
    }

    async fn complete_onboarding(
        &self,
        user_id: u64,
        ott: Vec<String>,
        liked_genres: Vec<String>,
        preference_vector: Vec<u8>,
    ) -> Result<UserProfile, ProfileError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or(ProfileError::NotFound(user_id))?;
        entry.ott = ott;
        entry.liked_genres = liked_genres;
        entry.preference_vector = preference_vector;
        entry.onboarding_completed = true;
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_onboarding_updates_known_user() {
        let store = InMemoryProfileStore::new();
        store.insert(UserProfile::new(1, "user@example.com"));

        let updated = store
            .complete_onboarding(
                1,
                vec!["Netflix".into()],
                vec!["Action".into()],
                vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            )
            .await
            .unwrap();

        assert!(updated.onboarding_completed);
        assert_eq!(updated.ott, ["Netflix"]);
        assert_eq!(store.get(1).await.unwrap().unwrap().liked_genres, ["Action"]);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_and_nothing_changes() {
        let store = InMemoryProfileStore::new();
        store.insert(UserProfile::new(1, "user@example.com"));

        let err = store
            .complete_onboarding(999, vec![], vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(999)));

        let untouched = store.get(1).await.unwrap().unwrap();
        assert!(!untouched.onboarding_completed);
    }
}
