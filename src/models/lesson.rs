use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::ChatError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Self>, ChatError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            "SELECT id, title, content, created_at FROM lessons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(lesson)
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, ChatError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lessons WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    /// Renders the lesson as grounding context for the completion client.
    pub async fn context(pool: &PgPool, id: Uuid) -> Result<String, ChatError> {
        let lesson = Self::get(pool, id)
            .await?
            .ok_or(ChatError::LessonNotFound(id))?;

        Ok(format!("# {}\n\n{}", lesson.title, lesson.content))
    }
}
