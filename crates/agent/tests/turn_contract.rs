//! End-to-end contract over the shipped farmer intake flow: a bilingual
//! multi-turn conversation fills every slot, survives conditional branching,
//! and lands on a fully explainable artifact bundle.

use std::sync::Arc;

use rust_decimal::Decimal;

use anihan_agent::llm::ScriptedBackend;
use anihan_agent::orchestrator::{EngineSettings, Orchestrator, TurnRequest};
use anihan_core::audit::InMemoryAuditSink;
use anihan_core::domain::conversation::ConversationId;
use anihan_core::flow::definition::Audience;
use anihan_core::flow::registry::FlowRegistry;
use anihan_core::{ArtifactData, Readiness, Severity};
use anihan_db::store::InMemoryConversationStore;

fn orchestrator() -> (Orchestrator, Arc<InMemoryAuditSink>) {
    // The registry reads the real flow documents shipped with the repo.
    let registry = Arc::new(FlowRegistry::new("../../flows"));
    let audit = Arc::new(InMemoryAuditSink::default());
    let orchestrator = Orchestrator::new(
        Arc::new(InMemoryConversationStore::default()),
        Arc::new(ScriptedBackend::with_replies(["ok", "ok", "ok", "ok", "ok"])),
        registry,
        Arc::clone(&audit) as Arc<dyn anihan_core::audit::AuditSink>,
        EngineSettings::default(),
    );
    (orchestrator, audit)
}

fn turn(text: &str) -> TurnRequest {
    TurnRequest {
        conversation_id: ConversationId::new("it-1"),
        audience: Audience::Farmer,
        flow_id: "farm-intake".to_owned(),
        text: text.to_owned(),
        dialect: None,
        correlation_id: "it".to_owned(),
    }
}

#[tokio::test]
async fn farmer_intake_conversation_reaches_a_ready_explainable_bundle() {
    let (orchestrator, _audit) = orchestrator();

    let outcome = orchestrator
        .handle_message(turn("Magandang umaga! Palay ang tanim ko"))
        .await
        .expect("crop turn");
    assert_eq!(outcome.next_step_id.as_deref(), Some("ask-size"));

    // 2.5 ha satisfies the `gt 1` branch, which jumps to irrigation.
    let outcome = orchestrator
        .handle_message(turn("Mga 2.5 hectares ang sakahan namin"))
        .await
        .expect("size turn");
    assert_eq!(outcome.next_step_id.as_deref(), Some("ask-irrigation"));

    let outcome = orchestrator
        .handle_message(turn("Rainfed lang ang bukid"))
        .await
        .expect("irrigation turn");
    assert_eq!(outcome.next_step_id.as_deref(), Some("ask-location"));

    let outcome = orchestrator
        .handle_message(turn("province: Nueva Ecija"))
        .await
        .expect("location turn");
    let progress = outcome.progress.expect("progress");
    assert_eq!(progress.percent, 100);
    assert_eq!(outcome.next_step_id.as_deref(), Some("ask-existing-loan"));

    let outcome = orchestrator.handle_message(turn("Wala")).await.expect("loan turn");
    assert!(outcome.flow_complete);

    let bundle = orchestrator
        .artifact_bundle(&ConversationId::new("it-1"), Audience::Farmer, None, "it")
        .await
        .expect("bundle");

    assert_eq!(bundle.readiness, Readiness::Ready);
    assert!(bundle.missing.is_empty());

    let risk_flags = bundle
        .artifacts
        .iter()
        .find_map(|artifact| match &artifact.data {
            ArtifactData::RiskFlags(data) => Some(data),
            _ => None,
        })
        .expect("risk flags artifact");
    let weather = risk_flags
        .flags
        .iter()
        .find(|flag| flag.code == "WEATHER_RISK")
        .expect("rainfed farm must carry weather risk");
    assert_eq!(weather.severity, Severity::High);
    assert!(risk_flags.flags.iter().any(|flag| flag.code == "LABOR_RISK"));

    let suggestion = bundle
        .artifacts
        .iter()
        .find_map(|artifact| match &artifact.data {
            ArtifactData::LoanSuggestion(data) => Some(data),
            _ => None,
        })
        .expect("suggestion artifact");

    // 2.5 ha of rice: 100k-125k estimated costs, midpoint base, one high
    // risk flag cuts 15%, development policy rounds to 100.
    assert_eq!(suggestion.base_amount, Decimal::from(112_500));
    assert_eq!(suggestion.suggested_amount, Decimal::from(95_600));

    let impact_total: Decimal =
        suggestion.adjustments.iter().map(|adjustment| adjustment.impact).sum();
    assert_eq!(suggestion.base_amount + impact_total, suggestion.suggested_amount);
}

#[tokio::test]
async fn shipped_flow_documents_pass_strict_validation() {
    let registry = FlowRegistry::new("../../flows");
    for (audience, flow_id) in
        [(Audience::Farmer, "farm-intake"), (Audience::LoanOfficer, "loan-intake")]
    {
        let flow = registry.get(audience, flow_id).expect("flow document loads");
        let issues = flow.validate();
        assert!(issues.is_empty(), "{flow_id} has authoring issues: {issues:?}");
    }
}
