use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;
use crate::models::lesson::Lesson;
use crate::models::message::Message;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    /// Set when the conversation is scoped to one lesson; a general-purpose
    /// conversation carries no lesson.
    pub lesson_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A conversation together with its messages in submission order.
#[derive(Debug, Serialize)]
pub struct ChatHistory {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation for a user, optionally tied to a lesson. A
    /// lesson id that does not resolve fails the creation.
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        lesson_id: Option<Uuid>,
    ) -> Result<Self, ChatError> {
        if let Some(lesson_id) = lesson_id {
            if !Lesson::exists(pool, lesson_id).await? {
                return Err(ChatError::LessonNotFound(lesson_id));
            }
        }

        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            lesson_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, lesson_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id)
        .bind(&conversation.user_id)
        .bind(conversation.lesson_id)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(pool)
        .await?;

        debug!("Conversation created: {}", conversation.id);
        Ok(conversation)
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Self>, ChatError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, user_id, lesson_id, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    /// The user's conversations, most recently updated first.
    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, ChatError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, user_id, lesson_id, created_at, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(conversations)
    }

    /// Loads a conversation and its ordered messages. `None` means the id did
    /// not resolve — callers use that to decide to start a new conversation,
    /// so it is not an error.
    pub async fn history(pool: &PgPool, id: Uuid) -> Result<Option<ChatHistory>, ChatError> {
        let Some(conversation) = Self::get(pool, id).await? else {
            return Ok(None);
        };

        let messages = Message::for_conversation(pool, id).await?;
        Ok(Some(ChatHistory {
            conversation,
            messages,
        }))
    }

    /// Bumps `updated_at`. Callers treat a failure here as non-fatal.
    pub async fn touch(pool: &PgPool, id: Uuid) -> Result<(), ChatError> {
        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
