use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use anihan_agent::orchestrator::TurnRequest;
use anihan_core::domain::conversation::ConversationId;
use anihan_core::errors::InterfaceError;
use anihan_core::flow::definition::Audience;
use anihan_core::flow::progress::Progress;
use anihan_core::lang::Dialect;
use anihan_core::ArtifactBundle;

use crate::bootstrap::AppState;
use crate::health;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/api/conversations/{id}/messages", post(post_message))
        .route("/api/conversations/{id}/artifacts", get(get_artifacts))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub text: String,
    pub audience: String,
    #[serde(default)]
    pub flow_id: Option<String>,
    #[serde(default)]
    pub dialect: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub reply: String,
    pub progress: Option<Progress>,
    pub next_step_id: Option<String>,
    pub flow_complete: bool,
    pub fallback_used: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactQuery {
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub dialect: Option<String>,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, correlation_id) = match &self.0 {
            InterfaceError::BadRequest { correlation_id, .. } => {
                (StatusCode::BAD_REQUEST, correlation_id.clone())
            }
            InterfaceError::TooManyRequests { correlation_id, .. } => {
                (StatusCode::TOO_MANY_REQUESTS, correlation_id.clone())
            }
            InterfaceError::ServiceUnavailable { correlation_id, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, correlation_id.clone())
            }
            InterfaceError::Internal { correlation_id, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, correlation_id.clone())
            }
        };
        let body = serde_json::json!({
            "error": self.0.user_message(),
            "correlationId": correlation_id,
        });
        (status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>, correlation_id: &str) -> ApiError {
    ApiError(InterfaceError::BadRequest {
        message: message.into(),
        correlation_id: correlation_id.to_owned(),
    })
}

fn parse_audience(raw: &str, correlation_id: &str) -> Result<Audience, ApiError> {
    Audience::parse(raw)
        .ok_or_else(|| bad_request(format!("unknown audience `{raw}`"), correlation_id))
}

fn parse_dialect(raw: Option<&str>, correlation_id: &str) -> Result<Option<Dialect>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => Dialect::parse(raw)
            .map(Some)
            .ok_or_else(|| bad_request(format!("unknown dialect `{raw}`"), correlation_id)),
    }
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<Json<TurnResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let audience = parse_audience(&body.audience, &correlation_id)?;
    let dialect = parse_dialect(body.dialect.as_deref(), &correlation_id)?;
    if body.text.trim().is_empty() {
        return Err(bad_request("message text must not be empty", &correlation_id));
    }

    let outcome = state
        .orchestrator
        .handle_message(TurnRequest {
            conversation_id: ConversationId::new(id),
            audience,
            flow_id: body.flow_id.unwrap_or_else(|| "farm-intake".to_owned()),
            text: body.text,
            dialect,
            correlation_id: correlation_id.clone(),
        })
        .await
        .map_err(|error| ApiError(error.into_interface(correlation_id)))?;

    Ok(Json(TurnResponse {
        reply: outcome.reply,
        progress: outcome.progress,
        next_step_id: outcome.next_step_id,
        flow_complete: outcome.flow_complete,
        fallback_used: outcome.fallback_used,
    }))
}

pub async fn get_artifacts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ArtifactQuery>,
) -> Result<Json<ArtifactBundle>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let audience = match query.audience.as_deref() {
        Some(raw) => parse_audience(raw, &correlation_id)?,
        None => Audience::Farmer,
    };
    let dialect = parse_dialect(query.dialect.as_deref(), &correlation_id)?;

    let bundle = state
        .orchestrator
        .artifact_bundle(&ConversationId::new(id), audience, dialect, &correlation_id)
        .await
        .map_err(|error| ApiError(error.into_interface(correlation_id)))?;

    Ok(Json(bundle))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::Json;

    use anihan_agent::llm::ScriptedBackend;
    use anihan_agent::orchestrator::{EngineSettings, Orchestrator};
    use anihan_core::audit::NoopAuditSink;
    use anihan_core::flow::definition::{
        Audience, FlowDefinition, FlowIntro, Slot, SlotType, Step,
    };
    use anihan_core::flow::registry::FlowRegistry;
    use anihan_core::lang::Dialect;
    use anihan_db::connection::connect_with_settings;
    use anihan_db::migrations;
    use anihan_db::store::InMemoryConversationStore;

    use crate::bootstrap::AppState;
    use crate::routes::{get_artifacts, post_message, ArtifactQuery, MessageBody};

    fn intake_flow() -> FlowDefinition {
        FlowDefinition {
            id: "farm-intake".to_owned(),
            version: 1,
            audience: Audience::Farmer,
            dialects_supported: vec!["en".to_owned()],
            intro: FlowIntro {
                title: "Farm intake".to_owned(),
                description: "collect farm basics".to_owned(),
            },
            slots: vec![Slot {
                key: "hectares".to_owned(),
                label: "Farm size".to_owned(),
                slot_type: SlotType::Number,
                required: true,
                options: Vec::new(),
                validation: None,
                save_to_profile: false,
                profile_field: None,
            }],
            steps: vec![Step {
                id: "ask-size".to_owned(),
                title: "Size".to_owned(),
                prompt: "How many hectares?".to_owned(),
                slot_keys: vec!["hectares".to_owned()],
                suggestions: Vec::new(),
                next: None,
            }],
            report_template: None,
        }
    }

    async fn app_state(replies: &[&str]) -> Arc<AppState> {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let registry = Arc::new(FlowRegistry::new("/nonexistent"));
        registry.insert(intake_flow());
        let orchestrator = Orchestrator::new(
            Arc::new(InMemoryConversationStore::default()),
            Arc::new(ScriptedBackend::with_replies(replies.iter().copied())),
            registry,
            Arc::new(NoopAuditSink),
            EngineSettings::default(),
        );

        Arc::new(AppState { orchestrator, pool, default_dialect: Dialect::English })
    }

    #[tokio::test]
    async fn post_message_runs_a_turn_and_reports_progress() {
        let state = app_state(&["Noted, thank you!"]).await;

        let response = post_message(
            State(state),
            Path("c-1".to_owned()),
            Json(MessageBody {
                text: "I farm 3.5 hectares".to_owned(),
                audience: "farmer".to_owned(),
                flow_id: Some("farm-intake".to_owned()),
                dialect: None,
            }),
        )
        .await
        .expect("turn");

        assert_eq!(response.0.reply, "Noted, thank you!");
        assert!(response.0.flow_complete);
        assert_eq!(response.0.progress.as_ref().map(|p| p.percent), Some(100));
    }

    #[tokio::test]
    async fn unknown_audience_is_a_bad_request() {
        let state = app_state(&[]).await;

        let error = post_message(
            State(state),
            Path("c-1".to_owned()),
            Json(MessageBody {
                text: "hello".to_owned(),
                audience: "auditor".to_owned(),
                flow_id: None,
                dialect: None,
            }),
        )
        .await
        .expect_err("must reject");

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_text_is_a_bad_request() {
        let state = app_state(&[]).await;

        let error = post_message(
            State(state),
            Path("c-1".to_owned()),
            Json(MessageBody {
                text: "   ".to_owned(),
                audience: "farmer".to_owned(),
                flow_id: None,
                dialect: None,
            }),
        )
        .await
        .expect_err("must reject");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn artifacts_endpoint_returns_the_bundle() {
        let state = app_state(&["ok"]).await;

        post_message(
            State(Arc::clone(&state)),
            Path("c-2".to_owned()),
            Json(MessageBody {
                text: "2 hectares of palay".to_owned(),
                audience: "farmer".to_owned(),
                flow_id: Some("farm-intake".to_owned()),
                dialect: None,
            }),
        )
        .await
        .expect("turn");

        let bundle = get_artifacts(
            State(state),
            Path("c-2".to_owned()),
            Query(ArtifactQuery { audience: Some("farmer".to_owned()), dialect: None }),
        )
        .await
        .expect("bundle");

        assert!(!bundle.0.artifacts.is_empty());
    }
}
