pub mod completion;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod sse;
pub mod types;

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::completion::CompletionClient;
use crate::models::lesson::Lesson;

pub use crate::config::AppConfig;

pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub completion: CompletionClient,
    lesson_context_cache: Cache<Uuid, String>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let completion = CompletionClient::from_config(&config);
        // Lesson bodies are static content, so a short-lived cache saves a
        // round trip per chat turn without a real staleness risk.
        let lesson_context_cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(Duration::from_secs(300))
            .build();

        AppState {
            pool,
            config,
            completion,
            lesson_context_cache,
        }
    }

    /// Best-effort lookup of the grounding context for a lesson. A missing
    /// lesson or a storage failure means the chat proceeds ungrounded.
    pub async fn grounding_context(&self, lesson_id: Uuid) -> Option<String> {
        match self
            .lesson_context_cache
            .try_get_with(lesson_id, Lesson::context(&self.pool, lesson_id))
            .await
        {
            Ok(context) => Some(context),
            Err(e) => {
                warn!("No grounding context for lesson {}: {}", lesson_id, e);
                None
            }
        }
    }
}
