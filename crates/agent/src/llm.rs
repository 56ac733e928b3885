use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use anihan_core::domain::conversation::Message;

/// The opaque language-generation collaborator. The engine only ever feeds
/// it a prompt plus history and takes plain text back; no structural
/// decision depends on its output.
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    async fn generate(&self, system_prompt: &str, history: &[Message]) -> Result<String>;
}

/// Test backend that replays a fixed list of replies, then errors.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub fn with_replies(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl LanguageBackend for ScriptedBackend {
    async fn generate(&self, _system_prompt: &str, _history: &[Message]) -> Result<String> {
        let mut replies = match self.replies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        replies.pop_front().ok_or_else(|| anyhow::anyhow!("scripted backend exhausted"))
    }
}

/// Backend for fully offline runs (CLI simulation). Always fails, which
/// exercises the orchestrator's deterministic fallback path.
#[derive(Clone, Copy, Default)]
pub struct OfflineBackend;

#[async_trait]
impl LanguageBackend for OfflineBackend {
    async fn generate(&self, _system_prompt: &str, _history: &[Message]) -> Result<String> {
        Err(anyhow::anyhow!("language backend disabled in offline mode"))
    }
}
