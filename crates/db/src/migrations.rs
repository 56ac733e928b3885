//! Embedded schema bootstrap. Statements are idempotent so startup can run
//! them unconditionally; there is no external migrations directory to ship.

use crate::DbPool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS conversation_message (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_conversation_message_conversation_id
        ON conversation_message (conversation_id, created_at)",
    "CREATE TABLE IF NOT EXISTS flow_state (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id TEXT NOT NULL,
        flow_id TEXT NOT NULL,
        snapshot_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_flow_state_conversation_id
        ON flow_state (conversation_id, id)",
];

pub async fn run_pending(pool: &DbPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
