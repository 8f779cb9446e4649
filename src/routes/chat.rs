use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use tracing::error;
use uuid::Uuid;

use crate::completion::ChatTurn;
use crate::error::{ApiError, ChatError};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::conversation::{ChatHistory, Conversation};
use crate::models::message::{Message, Role};
use crate::sse;
use crate::types::ChatStreamRequest;
use crate::AppState;

/// The streaming chat endpoint: takes one user turn, answers with an SSE
/// stream of completion fragments, and records both sides of the exchange.
#[post("/stream")]
pub async fn stream_chat(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<ChatStreamRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = authenticated_user.user_id;
    let request = req_body.into_inner();

    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    // Grounding context is best effort; an unresolvable lesson just means an
    // ungrounded answer.
    let context = match request.lesson_id {
        Some(lesson_id) => app_state.grounding_context(lesson_id).await,
        None => None,
    };

    // Resume the conversation when the supplied id resolves, start a fresh
    // one otherwise.
    let (conversation, mut turns) = match request.conversation_id {
        Some(id) => match Conversation::history(&app_state.pool, id).await {
            Ok(Some(history)) => {
                let turns: Vec<ChatTurn> =
                    history.messages.iter().map(ChatTurn::from).collect();
                (history.conversation, turns)
            }
            Ok(None) => (
                start_conversation(&app_state, &user_id, request.lesson_id).await?,
                Vec::new(),
            ),
            Err(e) => {
                error!("Failed to load conversation {}: {}", id, e);
                return Err(ApiError::internal(e.to_string()));
            }
        },
        None => (
            start_conversation(&app_state, &user_id, request.lesson_id).await?,
            Vec::new(),
        ),
    };

    // Record the user turn; the model call proceeds even if this fails, so
    // the learner still gets an answer when history logging is down.
    if let Err(e) = Message::append(&app_state.pool, conversation.id, Role::User, &message).await {
        error!(
            "Failed to record user message for conversation {}: {}",
            conversation.id, e
        );
    }

    turns.push(ChatTurn {
        role: Role::User,
        content: message,
    });

    let chunks = app_state
        .completion
        .stream(&turns, context.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to start completion stream: {}", e);
            ApiError::internal(e.to_string())
        })?;

    let pool = app_state.pool.clone();
    let conversation_id = conversation.id;
    let body = sse::forward(chunks, move |content: String| async move {
        if let Err(e) = Message::append(&pool, conversation_id, Role::Assistant, &content).await {
            error!(
                "Failed to record assistant message for conversation {}: {}",
                conversation_id, e
            );
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(body))
}

async fn start_conversation(
    app_state: &AppState,
    user_id: &str,
    lesson_id: Option<Uuid>,
) -> Result<Conversation, ApiError> {
    Conversation::create(&app_state.pool, user_id, lesson_id)
        .await
        .map_err(|e| {
            error!("Failed to create conversation: {}", e);
            ApiError::internal(e.to_string())
        })
}

#[get("/conversations")]
pub async fn list_conversations(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<Vec<Conversation>>, ApiError> {
    let conversations =
        Conversation::list_for_user(&app_state.pool, &authenticated_user.user_id)
            .await
            .map_err(|e| {
                error!("Failed to list conversations: {}", e);
                ApiError::from(e)
            })?;

    Ok(web::Json(conversations))
}

#[get("/conversations/{conversation_id}")]
pub async fn get_conversation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    conversation_id: web::Path<Uuid>,
) -> Result<web::Json<ChatHistory>, ApiError> {
    let conversation_id = conversation_id.into_inner();
    let history = Conversation::history(&app_state.pool, conversation_id)
        .await
        .map_err(|e| {
            error!("Failed to load conversation {}: {}", conversation_id, e);
            ApiError::from(e)
        })?;

    // Another user's conversation is indistinguishable from a missing one.
    match history {
        Some(history) if history.conversation.user_id == authenticated_user.user_id => {
            Ok(web::Json(history))
        }
        _ => Err(ChatError::ConversationNotFound(conversation_id).into()),
    }
}
