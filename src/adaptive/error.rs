use crate::adaptive::generator::GeneratorError;
use crate::adaptive::persistence::StoreError;
use crate::adaptive::types::ProfileKey;

#[derive(Debug, thiserror::Error)]
pub enum AdaptiveError {
    #[error("profile unavailable for {}/{}: {source}", key.student_id, key.curriculum)]
    ProfileUnavailable {
        key: ProfileKey,
        #[source]
        source: StoreError,
    },
    #[error("exercise generation failed: {0}")]
    Generation(#[from] GeneratorError),
}

impl AdaptiveError {
    pub fn profile_unavailable(key: &ProfileKey, source: StoreError) -> Self {
        Self::ProfileUnavailable {
            key: key.clone(),
            source,
        }
    }
}
