use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::adaptive::types::{AdaptiveProfile, ProfileKey, SessionSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stale write: stored version {stored}, attempted {attempted}")]
    VersionConflict { stored: u64, attempted: u64 },
}

/// Durable home of adaptive profiles and completed-session summaries.
///
/// Implementations own write serialization per key; `commit_session` must
/// reject a profile whose `version` no longer matches what is stored.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, key: &ProfileKey) -> Result<Option<AdaptiveProfile>, StoreError>;

    /// Persists the profile together with the summary of the session that
    /// produced it, as one unit. Returns the profile with its new version.
    async fn commit_session(
        &self,
        profile: AdaptiveProfile,
        summary: SessionSummary,
    ) -> Result<AdaptiveProfile, StoreError>;

    /// Most recent summaries, oldest first, at most `limit`.
    async fn recent_sessions(&self, key: &ProfileKey, limit: usize) -> Result<Vec<SessionSummary>, StoreError>;
}

#[derive(Default)]
struct StoreData {
    profiles: HashMap<ProfileKey, AdaptiveProfile>,
    sessions: HashMap<ProfileKey, Vec<SessionSummary>>,
}

/// Process-local store for embedding hosts and tests.
#[derive(Default)]
pub struct InMemoryProfileStore {
    data: RwLock<StoreData>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn profile_count(&self) -> usize {
        self.data.read().await.profiles.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load_profile(&self, key: &ProfileKey) -> Result<Option<AdaptiveProfile>, StoreError> {
        Ok(self.data.read().await.profiles.get(key).cloned())
    }

    async fn commit_session(
        &self,
        mut profile: AdaptiveProfile,
        summary: SessionSummary,
    ) -> Result<AdaptiveProfile, StoreError> {
        let key = profile.key();
        let mut data = self.data.write().await;

        let stored_version = data.profiles.get(&key).map(|p| p.version).unwrap_or(0);
        if stored_version != profile.version {
            return Err(StoreError::VersionConflict {
                stored: stored_version,
                attempted: profile.version,
            });
        }

        profile.version += 1;
        profile.updated_at = Utc::now();
        data.profiles.insert(key.clone(), profile.clone());

        let sessions = data.sessions.entry(key).or_default();
        sessions.push(summary);
        sessions.sort_by_key(|s| s.completed_at);
        Ok(profile)
    }

    async fn recent_sessions(&self, key: &ProfileKey, limit: usize) -> Result<Vec<SessionSummary>, StoreError> {
        let data = self.data.read().await;
        let Some(sessions) = data.sessions.get(key) else {
            return Ok(Vec::new());
        };
        let skip = sessions.len().saturating_sub(limit);
        Ok(sessions[skip..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn summary(id: usize) -> SessionSummary {
        SessionSummary {
            session_id: format!("session-{id}"),
            completed_at: Utc::now() + Duration::minutes(id as i64),
            accuracy: 0.5,
            average_time_seconds: 20.0,
            type_tallies: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn commit_bumps_version_and_rejects_stale_writes() {
        let store = InMemoryProfileStore::new();
        let key = ProfileKey::new("s1", "arithmetic");

        let saved = store.commit_session(AdaptiveProfile::new(&key), summary(0)).await.unwrap();
        assert_eq!(saved.version, 1);

        let stale = AdaptiveProfile::new(&key);
        let err = store.commit_session(stale, summary(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { stored: 1, attempted: 0 }));
        // The rejected commit leaves no summary behind.
        assert_eq!(store.recent_sessions(&key, 10).await.unwrap().len(), 1);

        let loaded = store.load_profile(&key).await.unwrap().unwrap();
        let resaved = store.commit_session(loaded, summary(2)).await.unwrap();
        assert_eq!(resaved.version, 2);
        assert_eq!(store.profile_count().await, 1);
        assert_eq!(store.recent_sessions(&key, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn recent_sessions_returns_newest_window_oldest_first() {
        let store = InMemoryProfileStore::new();
        let key = ProfileKey::new("s1", "arithmetic");
        let mut profile = AdaptiveProfile::new(&key);
        for id in (0..12).rev() {
            profile = store.commit_session(profile, summary(id)).await.unwrap();
        }

        let recent = store.recent_sessions(&key, 10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].session_id, "session-2");
        assert_eq!(recent[9].session_id, "session-11");

        let other = ProfileKey::new("s2", "arithmetic");
        assert!(store.recent_sessions(&other, 10).await.unwrap().is_empty());
    }
}
