use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Expected failures of the chat pipeline. Callers branch on the variant, not
/// on message strings.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("completion API key is not configured")]
    ApiKeyNotSet,

    #[error("lesson {0} not found")]
    LessonNotFound(Uuid),

    #[error("conversation {0} not found")]
    ConversationNotFound(Uuid),

    #[error("permission denied")]
    PermissionDenied,

    #[error("{message}")]
    Unknown {
        code: Option<String>,
        message: String,
    },
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            // 42501 is insufficient_privilege, which is what Postgres raises
            // when row security rejects a statement.
            if db.code().as_deref() == Some("42501") {
                return ChatError::PermissionDenied;
            }
            return ChatError::Unknown {
                code: db.code().map(|code| code.into_owned()),
                message: db.message().to_string(),
            };
        }

        ChatError::Unknown {
            code: None,
            message: err.to_string(),
        }
    }
}

/// HTTP-facing error: a status plus a `{"error": …}` body.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match err {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::LessonNotFound(_) | ChatError::ConversationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ChatError::PermissionDenied => StatusCode::FORBIDDEN,
            ChatError::ApiKeyNotSet | ChatError::Unknown { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_error_kinds_map_to_statuses() {
        let lesson = Uuid::new_v4();
        let conversation = Uuid::new_v4();

        assert_eq!(
            ApiError::from(ChatError::Validation("empty".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ChatError::LessonNotFound(lesson)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ChatError::ConversationNotFound(conversation)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ChatError::PermissionDenied).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(ChatError::ApiKeyNotSet).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_carries_the_message() {
        let resp = ApiError::bad_request("message is required").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_keeps_the_underlying_code() {
        let err = ChatError::Unknown {
            code: Some("23503".into()),
            message: "violates foreign key".into(),
        };
        assert_eq!(err.to_string(), "violates foreign key");
    }
}
