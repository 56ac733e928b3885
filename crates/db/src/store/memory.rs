use std::collections::HashMap;

use tokio::sync::RwLock;

use anihan_core::domain::conversation::{ConversationId, FlowStateSnapshot, Message};

use super::{ConversationStore, StoreError};

/// In-memory store backing tests and the offline simulator. Same contract
/// as the SQLite store, including oldest-first message ordering.
#[derive(Default)]
pub struct InMemoryConversationStore {
    messages: RwLock<HashMap<String, Vec<Message>>>,
    states: RwLock<HashMap<String, Vec<FlowStateSnapshot>>>,
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append_message(&self, message: Message) -> Result<(), StoreError> {
        let mut messages = self.messages.write().await;
        messages.entry(message.conversation_id.0.clone()).or_default().push(message);
        Ok(())
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        let Some(history) = messages.get(&conversation_id.0) else {
            return Ok(Vec::new());
        };
        let skip = history.len().saturating_sub(limit as usize);
        Ok(history[skip..].to_vec())
    }

    async fn latest_flow_state(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<FlowStateSnapshot>, StoreError> {
        let states = self.states.read().await;
        Ok(states.get(&conversation_id.0).and_then(|history| history.last().cloned()))
    }

    async fn append_flow_state(
        &self,
        conversation_id: &ConversationId,
        snapshot: FlowStateSnapshot,
    ) -> Result<(), StoreError> {
        let mut states = self.states.write().await;
        states.entry(conversation_id.0.clone()).or_default().push(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use anihan_core::domain::conversation::{ConversationId, FlowStateSnapshot, Message, Role};
    use anihan_core::flow::definition::Audience;
    use anihan_core::flow::progress::Progress;
    use anihan_core::flow::state::SlotValues;

    use crate::store::{ConversationStore, InMemoryConversationStore};

    fn snapshot(filled: u32) -> FlowStateSnapshot {
        FlowStateSnapshot {
            flow_id: "farm-intake".to_owned(),
            audience: Audience::Farmer,
            slots: SlotValues::new(),
            progress: Progress {
                required_total: 3,
                required_filled: filled,
                percent: (filled * 33) as u8,
                missing_required: Vec::new(),
            },
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first_and_limited() {
        let store = InMemoryConversationStore::default();
        let id = ConversationId::new("c-1");
        for index in 0..4 {
            store
                .append_message(Message::new(id.clone(), Role::User, format!("turn {index}")))
                .await
                .expect("append");
        }

        let recent = store.recent_messages(&id, 2).await.expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "turn 2");
        assert_eq!(recent[1].content, "turn 3");
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let store = InMemoryConversationStore::default();
        store
            .append_message(Message::new(ConversationId::new("c-1"), Role::User, "mine"))
            .await
            .expect("append");

        let other = store.recent_messages(&ConversationId::new("c-2"), 10).await.expect("recent");
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn latest_flow_state_returns_the_newest_snapshot() {
        let store = InMemoryConversationStore::default();
        let id = ConversationId::new("c-1");
        assert!(store.latest_flow_state(&id).await.expect("latest").is_none());

        store.append_flow_state(&id, snapshot(1)).await.expect("append");
        store.append_flow_state(&id, snapshot(2)).await.expect("append");

        let latest = store.latest_flow_state(&id).await.expect("latest").expect("snapshot");
        assert_eq!(latest.progress.required_filled, 2);
    }
}
