use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;
use crate::models::lesson::Lesson;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LessonProgress {
    pub id: Uuid,
    pub user_id: String,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// Aggregated completion numbers for one user.
#[derive(Debug, FromRow, Serialize)]
pub struct ProgressStats {
    pub lessons_total: i64,
    pub lessons_completed: i64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// Records a lesson completion. One row per (user, lesson): a repeat call
    /// refreshes `completed_at` instead of adding a row.
    pub async fn complete(
        pool: &PgPool,
        user_id: &str,
        lesson_id: Uuid,
    ) -> Result<Self, ChatError> {
        if !Lesson::exists(pool, lesson_id).await? {
            return Err(ChatError::LessonNotFound(lesson_id));
        }

        let progress = sqlx::query_as::<_, LessonProgress>(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id, completed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, lesson_id)
            DO UPDATE SET completed_at = EXCLUDED.completed_at
            RETURNING id, user_id, lesson_id, completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(lesson_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        debug!("Lesson {} completed by {}", lesson_id, user_id);
        Ok(progress)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, ChatError> {
        let rows = sqlx::query_as::<_, LessonProgress>(
            r#"
            SELECT id, user_id, lesson_id, completed_at
            FROM lesson_progress
            WHERE user_id = $1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn stats(pool: &PgPool, user_id: &str) -> Result<ProgressStats, ChatError> {
        let stats = sqlx::query_as::<_, ProgressStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM lessons) AS lessons_total,
                COUNT(*) AS lessons_completed,
                MAX(completed_at) AS last_completed_at
            FROM lesson_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}
