use std::sync::Arc;

use actix_web::{get, post, web};
use tracing::error;

use crate::error::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::progress::{LessonProgress, ProgressStats};
use crate::types::CompleteLessonRequest;
use crate::AppState;

#[post("/complete")]
pub async fn complete_lesson(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<CompleteLessonRequest>,
) -> Result<web::Json<LessonProgress>, ApiError> {
    let progress = LessonProgress::complete(
        &app_state.pool,
        &authenticated_user.user_id,
        req_body.lesson_id,
    )
    .await
    .map_err(|e| {
        error!("Failed to record lesson completion: {}", e);
        ApiError::from(e)
    })?;

    Ok(web::Json(progress))
}

#[get("/stats")]
pub async fn progress_stats(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<ProgressStats>, ApiError> {
    let stats = LessonProgress::stats(&app_state.pool, &authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to aggregate progress stats: {}", e);
            ApiError::from(e)
        })?;

    Ok(web::Json(stats))
}

#[get("")]
pub async fn list_progress(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<Vec<LessonProgress>>, ApiError> {
    let rows = LessonProgress::list_for_user(&app_state.pool, &authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to list lesson completions: {}", e);
            ApiError::from(e)
        })?;

    Ok(web::Json(rows))
}
