use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Body of `POST /api/chat/stream`. Field names are the client's wire names.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamRequest {
    pub message: String,
    pub lesson_id: Option<Uuid>,
    pub conversation_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_wire_names() {
        let req: ChatStreamRequest = serde_json::from_str(
            r#"{"message":"hi","lessonId":"6f8f57e5-6b2a-4f3e-9f9e-2ab1c7e0b001"}"#,
        )
        .unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.lesson_id.is_some());
        assert!(req.conversation_id.is_none());
    }

    #[test]
    fn message_alone_is_enough() {
        let req: ChatStreamRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(req.lesson_id.is_none());
        assert!(req.conversation_id.is_none());
    }
}
