use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use anihan_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use anihan_core::config::AppConfig;
use anihan_core::domain::conversation::{ConversationId, FlowStateSnapshot, Message, Role};
use anihan_core::errors::ApplicationError;
use anihan_core::flow::definition::Audience;
use anihan_core::flow::navigator::{next_step, NavigationMode};
use anihan_core::flow::progress::{compute_progress, Progress};
use anihan_core::flow::registry::FlowRegistry;
use anihan_core::flow::state::merge;
use anihan_core::flow::SlotExtractor;
use anihan_core::lang::{fallback_reply, Dialect};
use anihan_core::policy;
use anihan_core::{build_artifacts, ArtifactBundle, ArtifactInput};
use anihan_db::store::{ConversationStore, StoreError};

use crate::llm::LanguageBackend;
use crate::prompts::{build_system_prompt, PromptContext};
use crate::ratelimit::RateLimiter;

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub deployment: String,
    pub default_dialect: Dialect,
    pub history_limit: u32,
    pub rate_limit_per_minute: u32,
    pub generation_timeout: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            deployment: config.engine.deployment.clone(),
            default_dialect: config.engine.default_dialect,
            history_limit: config.engine.history_limit,
            rate_limit_per_minute: config.engine.rate_limit_per_minute,
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            deployment: "development".to_owned(),
            default_dialect: Dialect::English,
            history_limit: 20,
            rate_limit_per_minute: 100,
            generation_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TurnRequest {
    pub conversation_id: ConversationId,
    pub audience: Audience,
    pub flow_id: String,
    pub text: String,
    pub dialect: Option<Dialect>,
    pub correlation_id: String,
}

#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub reply: String,
    pub progress: Option<Progress>,
    pub next_step_id: Option<String>,
    pub next_prompt: Option<String>,
    pub flow_complete: bool,
    pub fallback_used: bool,
}

/// Sequences one conversation turn end to end. All engine calls in between
/// the store reads and writes are pure; this struct is where the side
/// effects live, and turns for a single conversation must not run
/// concurrently (the merge step is order-sensitive).
pub struct Orchestrator {
    store: Arc<dyn ConversationStore>,
    backend: Arc<dyn LanguageBackend>,
    registry: Arc<FlowRegistry>,
    extractor: SlotExtractor,
    limiter: RateLimiter,
    audit: Arc<dyn AuditSink>,
    settings: EngineSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        backend: Arc<dyn LanguageBackend>,
        registry: Arc<FlowRegistry>,
        audit: Arc<dyn AuditSink>,
        settings: EngineSettings,
    ) -> Self {
        let limiter = RateLimiter::per_minute(settings.rate_limit_per_minute);
        Self {
            store,
            backend,
            registry,
            extractor: SlotExtractor::default(),
            limiter,
            audit,
            settings,
        }
    }

    pub async fn handle_message(
        &self,
        request: TurnRequest,
    ) -> Result<TurnOutcome, ApplicationError> {
        if !self.limiter.check(&request.conversation_id.0) {
            return Err(ApplicationError::RateLimited {
                conversation_id: request.conversation_id.0.clone(),
            });
        }

        let dialect = request.dialect.unwrap_or(self.settings.default_dialect);
        let flow = self.registry.get(request.audience, &request.flow_id);
        if flow.is_none() {
            tracing::warn!(
                flow_id = %request.flow_id,
                audience = request.audience.as_str(),
                "flow definition unavailable, continuing unguided"
            );
            self.audit.emit(
                AuditEvent::new(
                    Some(request.conversation_id.clone()),
                    request.correlation_id.clone(),
                    "flow.definition_missing",
                    AuditCategory::Flow,
                    "orchestrator",
                    AuditOutcome::Degraded,
                )
                .with_metadata("flow_id", request.flow_id.clone()),
            );
        }

        let prior = self
            .store
            .latest_flow_state(&request.conversation_id)
            .await
            .map_err(persistence)?;

        let user_message =
            Message::new(request.conversation_id.clone(), Role::User, request.text.clone());
        self.store.append_message(user_message).await.map_err(persistence)?;

        let mut slots = prior.map(|snapshot| snapshot.slots).unwrap_or_default();
        let mut progress: Option<Progress> = None;
        let mut presented_step = None;

        if let Some(flow) = flow.as_deref() {
            let extracted = self.extractor.extract(flow, &request.text);
            slots = merge(&slots, &extracted);
            let turn_progress = compute_progress(flow, &slots);
            // Lenient navigation absorbs dangling refs and cannot fail.
            presented_step = next_step(flow, &slots, NavigationMode::Lenient).unwrap_or(None);

            // State progress is durable before the language call; a backend
            // failure can only cost us wording, never collected data.
            let snapshot = FlowStateSnapshot {
                flow_id: flow.id.clone(),
                audience: flow.audience,
                slots: slots.clone(),
                progress: turn_progress.clone(),
                updated_at: Utc::now(),
            };
            self.store
                .append_flow_state(&request.conversation_id, snapshot)
                .await
                .map_err(persistence)?;

            self.audit.emit(
                AuditEvent::new(
                    Some(request.conversation_id.clone()),
                    request.correlation_id.clone(),
                    "flow.state_advanced",
                    AuditCategory::Flow,
                    "orchestrator",
                    AuditOutcome::Success,
                )
                .with_metadata("percent", turn_progress.percent.to_string())
                .with_metadata(
                    "next_step",
                    presented_step.map(|step| step.id.clone()).unwrap_or_else(|| "none".to_owned()),
                ),
            );
            progress = Some(turn_progress);
        }

        let history = self
            .store
            .recent_messages(&request.conversation_id, self.settings.history_limit)
            .await
            .map_err(persistence)?;
        let system_prompt = build_system_prompt(&PromptContext {
            flow: flow.as_deref(),
            slots: &slots,
            progress: progress.as_ref(),
            next_step: presented_step,
            audience: request.audience,
            dialect,
        });

        let generated = tokio::time::timeout(
            self.settings.generation_timeout,
            self.backend.generate(&system_prompt, &history),
        )
        .await;
        let (reply, fallback_used) = match generated {
            Ok(Ok(text)) if !text.trim().is_empty() => (text, false),
            Ok(Ok(_)) => {
                tracing::warn!("language backend replied empty, using fallback reply");
                (fallback_reply(dialect).to_owned(), true)
            }
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "language backend failed, using fallback reply");
                (fallback_reply(dialect).to_owned(), true)
            }
            Err(_) => {
                tracing::warn!("language backend timed out, using fallback reply");
                (fallback_reply(dialect).to_owned(), true)
            }
        };
        self.audit.emit(AuditEvent::new(
            Some(request.conversation_id.clone()),
            request.correlation_id.clone(),
            if fallback_used { "generation.fallback_used" } else { "generation.completed" },
            AuditCategory::Generation,
            "orchestrator",
            if fallback_used { AuditOutcome::Degraded } else { AuditOutcome::Success },
        ));

        self.store
            .append_message(Message::new(
                request.conversation_id.clone(),
                Role::Assistant,
                reply.clone(),
            ))
            .await
            .map_err(persistence)?;

        Ok(TurnOutcome {
            reply,
            next_step_id: presented_step.map(|step| step.id.clone()),
            next_prompt: presented_step.map(|step| step.prompt.clone()),
            flow_complete: flow.is_some() && presented_step.is_none(),
            progress,
            fallback_used,
        })
    }

    /// Derive the artifact bundle from the latest persisted state. Artifacts
    /// are views: nothing here writes back.
    pub async fn artifact_bundle(
        &self,
        conversation_id: &ConversationId,
        audience: Audience,
        dialect: Option<Dialect>,
        correlation_id: &str,
    ) -> Result<ArtifactBundle, ApplicationError> {
        let snapshot = self.store.latest_flow_state(conversation_id).await.map_err(persistence)?;
        let messages = self
            .store
            .recent_messages(conversation_id, self.settings.history_limit)
            .await
            .map_err(persistence)?;

        let (slots, missing_required, audience) = match snapshot {
            Some(snapshot) => {
                (snapshot.slots, snapshot.progress.missing_required, snapshot.audience)
            }
            None => (Default::default(), Vec::new(), audience),
        };

        let loan_policy = policy::resolve(&self.settings.deployment);
        let bundle = build_artifacts(
            &ArtifactInput {
                slots: &slots,
                recent_messages: &messages,
                missing_required: &missing_required,
                audience,
                dialect: dialect.unwrap_or(self.settings.default_dialect),
            },
            &loan_policy,
        );

        self.audit.emit(
            AuditEvent::new(
                Some(conversation_id.clone()),
                correlation_id,
                "artifact.bundle_built",
                AuditCategory::Artifact,
                "orchestrator",
                AuditOutcome::Success,
            )
            .with_metadata("readiness", format!("{:?}", bundle.readiness))
            .with_metadata("artifact_count", bundle.artifacts.len().to_string()),
        );

        Ok(bundle)
    }
}

fn persistence(error: StoreError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
