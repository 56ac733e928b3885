//! The conversation store: the only persistence surface the engine consumes.

use async_trait::async_trait;
use thiserror::Error;

use anihan_core::domain::conversation::{ConversationId, FlowStateSnapshot, Message};

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryConversationStore;
pub use sqlite::SqliteConversationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append_message(&self, message: Message) -> Result<(), StoreError>;

    /// Last `limit` messages for one conversation, oldest first.
    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, StoreError>;

    async fn latest_flow_state(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<FlowStateSnapshot>, StoreError>;

    async fn append_flow_state(
        &self,
        conversation_id: &ConversationId,
        snapshot: FlowStateSnapshot,
    ) -> Result<(), StoreError>;
}
