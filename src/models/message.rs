use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::models::conversation::Conversation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "role_enum", rename_all = "lowercase")] // SQL value name
#[serde(rename_all = "lowercase")] // JSON value name
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    /// Conversation-scoped position, starting at 0 with no gaps. Ordering is
    /// established by this value, not by `created_at`.
    pub seq: i32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Appends one message to a conversation and returns it.
    ///
    /// The conversation's `updated_at` bump afterwards is bookkeeping; losing
    /// it must not undo the append, so its failure is logged and swallowed.
    pub async fn append(
        pool: &PgPool,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Self, ChatError> {
        if Conversation::get(pool, conversation_id).await?.is_none() {
            return Err(ChatError::ConversationNotFound(conversation_id));
        }

        // Next slot is max(seq) + 1, read-then-write.
        // TODO: two concurrent appends to one conversation can both read the
        // same max and double-allocate a seq; closing that needs a
        // transactional guard or a server-side sequence.
        let seq: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM messages WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_one(pool)
        .await?;

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            seq,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, seq, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.role.clone())
        .bind(&message.content)
        .bind(message.seq)
        .bind(message.created_at)
        .execute(pool)
        .await?;

        debug!(
            "Message {} appended to conversation {} at seq {}",
            message.id, conversation_id, message.seq
        );

        if let Err(e) = Conversation::touch(pool, conversation_id).await {
            warn!("Failed to touch conversation {}: {}", conversation_id, e);
        }

        Ok(message)
    }

    /// All messages of a conversation, ordered by `seq` ascending.
    pub async fn for_conversation(
        pool: &PgPool,
        conversation_id: Uuid,
    ) -> Result<Vec<Self>, ChatError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, seq, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
