use chrono::{DateTime, Utc};
use sqlx::Row;

use anihan_core::domain::conversation::{ConversationId, FlowStateSnapshot, Message, Role};

use crate::DbPool;

use super::{ConversationStore, StoreError};

pub struct SqliteConversationStore {
    pool: DbPool,
}

impl SqliteConversationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| StoreError::Decode(format!("bad timestamp `{raw}`: {error}")))
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
    let role_raw: String = row.try_get("role")?;
    let role = Role::parse(&role_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown role `{role_raw}`")))?;
    let created_raw: String = row.try_get("created_at")?;

    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: ConversationId(row.try_get("conversation_id")?),
        role,
        content: row.try_get("content")?,
        created_at: parse_timestamp(&created_raw)?,
    })
}

#[async_trait::async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn append_message(&self, message: Message) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO conversation_message (id, conversation_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id.0)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, role, content, created_at
             FROM conversation_message
             WHERE conversation_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )
        .bind(&conversation_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, StoreError>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn latest_flow_state(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<FlowStateSnapshot>, StoreError> {
        let row = sqlx::query(
            "SELECT snapshot_json FROM flow_state
             WHERE conversation_id = ?1
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(&conversation_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("snapshot_json")?;
        let snapshot = serde_json::from_str(&raw)
            .map_err(|error| StoreError::Decode(format!("bad snapshot: {error}")))?;
        Ok(Some(snapshot))
    }

    async fn append_flow_state(
        &self,
        conversation_id: &ConversationId,
        snapshot: FlowStateSnapshot,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&snapshot)
            .map_err(|error| StoreError::Decode(format!("unserializable snapshot: {error}")))?;
        sqlx::query(
            "INSERT INTO flow_state (conversation_id, flow_id, snapshot_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&conversation_id.0)
        .bind(&snapshot.flow_id)
        .bind(raw)
        .bind(snapshot.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use anihan_core::domain::conversation::{ConversationId, FlowStateSnapshot, Message, Role};
    use anihan_core::flow::definition::Audience;
    use anihan_core::flow::progress::Progress;
    use anihan_core::flow::state::SlotValues;

    use crate::connection::connect_with_settings;
    use crate::migrations::run_pending;
    use crate::store::{ConversationStore, SqliteConversationStore};

    async fn store() -> SqliteConversationStore {
        // A single connection keeps the in-memory database alive and shared.
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        SqliteConversationStore::new(pool)
    }

    fn snapshot(slots: SlotValues) -> FlowStateSnapshot {
        let filled = slots.len() as u32;
        FlowStateSnapshot {
            flow_id: "farm-intake".to_owned(),
            audience: Audience::Farmer,
            slots,
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
    async fn message_round_trip_preserves_role_and_order() {
        let store = store().await;
        let id = ConversationId::new("c-7");

        store.append_message(Message::new(id.clone(), Role::User, "first")).await.expect("append");
        store
            .append_message(Message::new(id.clone(), Role::Assistant, "second"))
            .await
            .expect("append");

        let recent = store.recent_messages(&id, 10).await.expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "first");
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn recent_messages_honors_the_limit_keeping_newest() {
        let store = store().await;
        let id = ConversationId::new("c-8");
        for index in 0..5 {
            store
                .append_message(Message::new(id.clone(), Role::User, format!("turn {index}")))
                .await
                .expect("append");
        }

        let recent = store.recent_messages(&id, 3).await.expect("recent");
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "turn 2");
        assert_eq!(recent[2].content, "turn 4");
    }

    #[tokio::test]
    async fn flow_state_snapshots_round_trip_with_slots_intact() {
        let store = store().await;
        let id = ConversationId::new("c-9");

        let mut slots = SlotValues::new();
        slots.insert("crop".to_owned(), json!("rice"));
        store.append_flow_state(&id, snapshot(SlotValues::new())).await.expect("append");
        store.append_flow_state(&id, snapshot(slots.clone())).await.expect("append");

        let latest = store.latest_flow_state(&id).await.expect("latest").expect("snapshot");
        assert_eq!(latest.slots, slots);
        assert_eq!(latest.progress.required_filled, 1);

        let other = store.latest_flow_state(&ConversationId::new("c-10")).await.expect("latest");
        assert!(other.is_none());
    }
}
