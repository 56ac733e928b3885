use std::sync::Arc;

use anyhow::Result;

use anihan_agent::llm::{LanguageBackend, OfflineBackend};
use anihan_agent::orchestrator::{EngineSettings, Orchestrator};
use anihan_core::audit::{AuditEvent, AuditSink};
use anihan_core::config::AppConfig;
use anihan_core::flow::registry::FlowRegistry;
use anihan_core::lang::Dialect;
use anihan_db::connection::connect_with_settings;
use anihan_db::migrations;
use anihan_db::store::SqliteConversationStore;
use anihan_db::DbPool;

use crate::llm_http::OpenAiCompatBackend;

pub struct App {
    pub config: AppConfig,
    pub state: Arc<AppState>,
}

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub pool: DbPool,
    pub default_dialect: Dialect,
}

/// Audit sink that forwards engine events into structured logs.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        tracing::info!(
            event_name = %event.event_type,
            category = ?event.category,
            outcome = ?event.outcome,
            conversation_id = event
                .conversation_id
                .as_ref()
                .map(|id| id.0.as_str())
                .unwrap_or("unknown"),
            correlation_id = %event.correlation_id,
            metadata = ?event.metadata,
            "engine audit event"
        );
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<App> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await?;
    migrations::run_pending(&pool).await?;

    let registry = Arc::new(FlowRegistry::new(&config.engine.flows_dir));

    // Without a configured endpoint the engine still runs: deterministic
    // state collection works and replies use the fallback wording.
    let backend: Arc<dyn LanguageBackend> = match &config.llm.base_url {
        Some(_) => Arc::new(OpenAiCompatBackend::new(&config.llm)?),
        None => {
            tracing::warn!(
                "no llm.base_url configured; replies will use deterministic fallbacks"
            );
            Arc::new(OfflineBackend)
        }
    };

    let store = Arc::new(SqliteConversationStore::new(pool.clone()));
    let orchestrator = Orchestrator::new(
        store,
        backend,
        registry,
        Arc::new(TracingAuditSink),
        EngineSettings::from_config(&config),
    );

    let state = Arc::new(AppState {
        orchestrator,
        pool,
        default_dialect: config.engine.default_dialect,
    });

    Ok(App { config, state })
}
