pub mod artifacts;
pub mod audit;
pub mod benchmarks;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flow;
pub mod lang;
pub mod policy;
pub mod suggestion;

pub use artifacts::{
    build_artifacts, Artifact, ArtifactBundle, ArtifactData, ArtifactInput, ArtifactKind,
    Confidence, Readiness, Severity,
};
pub use domain::conversation::{ConversationId, FlowStateSnapshot, Message, Role};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flow::definition::{Audience, FlowDefinition, Slot, SlotType, Step};
pub use flow::extract::SlotExtractor;
pub use flow::navigator::{next_step, NavigationError, NavigationMode};
pub use flow::progress::{compute_progress, Progress};
pub use flow::registry::FlowRegistry;
pub use flow::state::{merge, SlotValues};
pub use lang::Dialect;
pub use policy::{LoanPolicy, SuggestionVisibility};
pub use suggestion::{compute_loan_suggestion, Adjustment, LoanSuggestionResult, SuggestionInput};
