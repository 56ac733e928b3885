//! Conversation orchestration over the deterministic flow engine.
//!
//! This crate owns the only stateful boundary in the system. Per incoming
//! message it sequences, in order:
//!
//! 1. **Rate limit** - explicit per-conversation limiter (`ratelimit`)
//! 2. **State read** - latest flow snapshot from the conversation store
//! 3. **Deterministic core** - extract, merge, progress, navigate
//! 4. **Snapshot write** - state progress is persisted *before* any AI call
//! 5. **Generation** - `LanguageBackend::generate` under a timeout, with a
//!    dialect-appropriate fallback reply on failure (`llm`, `prompts`)
//! 6. **Reply write** - the assistant message is appended either way
//!
//! # Safety Principle
//!
//! The language backend is strictly a phrasing layer. It never decides which
//! step comes next, what is recorded in slot state, or any loan amount.
//! Those are deterministic outcomes of the core engine, which is why a
//! backend failure degrades the wording of a turn but never its state.

pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod ratelimit;

pub use llm::{LanguageBackend, OfflineBackend, ScriptedBackend};
pub use orchestrator::{EngineSettings, Orchestrator, TurnOutcome, TurnRequest};
pub use ratelimit::RateLimiter;
