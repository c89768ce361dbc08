use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::decision::{RealTimeAdapter, SessionPersonalizer};
use crate::adaptive::error::AdaptiveError;
use crate::adaptive::generator::{ExerciseGenerator, GenerationRequest, GeneratorError};
use crate::adaptive::modeling::TrendAnalyzer;
use crate::adaptive::persistence::ProfileStore;
use crate::adaptive::pipeline::{self, SessionAnalysis};
use crate::adaptive::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSession {
    pub session_id: String,
    pub config: SessionConfig,
    pub generation_request: GenerationRequest,
    pub exercises: Vec<LiveExercise>,
    /// Whether answers for this session are tracked by `submit_answer`.
    pub realtime_enabled: bool,
}

pub struct AdaptiveEngine {
    config: Arc<RwLock<AdaptiveConfig>>,
    store: Arc<dyn ProfileStore>,
    sessions: Arc<RwLock<HashMap<String, SessionAdaptationState>>>,
}

impl AdaptiveEngine {
    pub fn new(config: AdaptiveConfig, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn config(&self) -> AdaptiveConfig {
        self.config.read().await.clone()
    }

    /// Swaps in a new configuration. Live sessions keep their state; the new
    /// parameters apply from the next call onward.
    pub async fn update_config(&self, config: AdaptiveConfig) {
        *self.config.write().await = config;
        tracing::info!("adaptive config updated");
    }

    pub async fn reload_config(&self) {
        self.update_config(AdaptiveConfig::from_env()).await;
    }

    /// Analyzes one completed session and commits the updated profile and
    /// its summary in a single store call. A failed commit writes nothing,
    /// and a session already in the profile's history is not applied again.
    pub async fn analyze_session(
        &self,
        key: &ProfileKey,
        session_id: &str,
        attempts: &[AttemptRecord],
    ) -> Result<SessionAnalysis, AdaptiveError> {
        let config = self.config().await;
        let profile = self.load_or_default(key).await?;

        let mut analysis = pipeline::analyze_session(&profile, session_id, attempts, Utc::now(), &config);
        let Some(summary) = analysis.summary.clone() else {
            return Ok(analysis);
        };

        let committed = self
            .store
            .commit_session(analysis.profile.clone(), summary)
            .await
            .map_err(|e| {
                tracing::warn!(
                    student_id = %key.student_id,
                    curriculum = %key.curriculum,
                    session_id,
                    error = %e,
                    "failed to commit session analysis"
                );
                AdaptiveError::profile_unavailable(key, e)
            })?;
        analysis.profile = committed;

        tracing::info!(
            student_id = %key.student_id,
            curriculum = %key.curriculum,
            session_id,
            accuracy = analysis.metrics.accuracy,
            difficulty = analysis.profile.difficulty_score,
            version = analysis.profile.version,
            "session analysis committed"
        );

        Ok(analysis)
    }

    pub async fn personalize_session(
        &self,
        key: &ProfileKey,
        request: &SessionRequest,
    ) -> Result<SessionConfig, AdaptiveError> {
        let (_, config) = self.personalize_with_profile(key, request).await?;
        Ok(config)
    }

    /// Personalizes, asks `generator` for exercises, and opens real-time
    /// tracking when the profile is consistent enough for it.
    pub async fn prepare_session(
        &self,
        key: &ProfileKey,
        session_id: &str,
        request: &SessionRequest,
        generator: &dyn ExerciseGenerator,
    ) -> Result<PreparedSession, AdaptiveError> {
        let (profile, config) = self.personalize_with_profile(key, request).await?;
        let personalization = self.config.read().await.personalization.clone();
        let generation_request = GenerationRequest::build(&profile, &config, request, &personalization);

        let exercises = generator.generate(&generation_request).await?;
        if exercises.is_empty() {
            return Err(GeneratorError::EmptyCurriculum(config.curriculum.clone()).into());
        }

        let realtime_enabled = config.adaptive_features.enable_real_time_adjustment;
        if realtime_enabled {
            self.start_session(session_id, config.time_limit_seconds).await;
        }

        tracing::info!(
            student_id = %key.student_id,
            session_id,
            exercises = exercises.len(),
            target_level = generation_request.target_level(),
            realtime_enabled,
            "session prepared"
        );

        Ok(PreparedSession {
            session_id: session_id.to_string(),
            config,
            generation_request,
            exercises,
            realtime_enabled,
        })
    }

    pub async fn start_session(&self, session_id: &str, time_limit_seconds: u32) {
        let adapter = RealTimeAdapter::new(self.config.read().await.realtime.clone());
        let state = adapter.start(session_id, time_limit_seconds, Utc::now());

        let mut sessions = self.sessions.write().await;
        if sessions.insert(session_id.to_string(), state).is_some() {
            tracing::warn!(session_id, "session restarted, previous real-time state dropped");
        }
    }

    /// Records one answer and retunes the unseen part of `exercises` when the
    /// session calls for it. Never fails; problems come back in the decision.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        response: ResponseSample,
        exercises: &mut [LiveExercise],
    ) -> AdaptationDecision {
        let adapter = RealTimeAdapter::new(self.config.read().await.realtime.clone());

        let mut sessions = self.sessions.write().await;
        let Some(state) = sessions.get_mut(session_id) else {
            tracing::debug!(session_id, "answer for unknown session");
            return AdaptationDecision::failed(format!("unknown session {session_id}"));
        };

        adapter.record_answer(state, response, exercises, Utc::now())
    }

    pub async fn session_state(&self, session_id: &str) -> Option<SessionAdaptationState> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops real-time state and hands it back to the caller.
    pub async fn end_session(&self, session_id: &str) -> Option<SessionAdaptationState> {
        let state = self.sessions.write().await.remove(session_id);
        if let Some(ref s) = state {
            tracing::info!(
                session_id,
                answers = s.current_exercise_index,
                adaptations = s.adaptation_count,
                "session ended"
            );
        }
        state
    }

    async fn personalize_with_profile(
        &self,
        key: &ProfileKey,
        request: &SessionRequest,
    ) -> Result<(AdaptiveProfile, SessionConfig), AdaptiveError> {
        let config = self.config().await;
        let profile = self.load_or_default(key).await?;

        let trend = TrendAnalyzer::new(config.trend.clone());
        let sessions = self
            .store
            .recent_sessions(key, trend.window_size())
            .await
            .map_err(|e| AdaptiveError::profile_unavailable(key, e))?;
        let analysis = trend.analyze(&sessions);

        let session_config = SessionPersonalizer::new(config.personalization).personalize(&profile, &analysis, request);
        Ok((profile, session_config))
    }

    async fn load_or_default(&self, key: &ProfileKey) -> Result<AdaptiveProfile, AdaptiveError> {
        match self.store.load_profile(key).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                tracing::debug!(
                    student_id = %key.student_id,
                    curriculum = %key.curriculum,
                    "no stored profile, starting from defaults"
                );
                Ok(AdaptiveProfile::new(key))
            }
            Err(e) => {
                tracing::warn!(
                    student_id = %key.student_id,
                    curriculum = %key.curriculum,
                    error = %e,
                    "failed to load adaptive profile"
                );
                Err(AdaptiveError::profile_unavailable(key, e))
            }
        }
    }
}
