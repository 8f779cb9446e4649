use std::fmt::Display;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_openai::Client;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ChatError;
use crate::models::message::{Message, Role};
use crate::prompts::Prompts;

/// One unit of chat history handed to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        ChatTurn {
            role: message.role.clone(),
            content: message.content.clone(),
        }
    }
}

/// One unit of completion output: incremental text, or a terminal marker.
/// Every stream ends with exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Text(String),
    Done,
    Error(String),
}

/// Client for the upstream streaming completion API.
///
/// Holds no connection state; each call opens its own upstream request.
/// Dropping the returned stream aborts that request, which is how consumer
/// cancellation propagates.
#[derive(Clone)]
pub struct CompletionClient {
    api_key: Option<String>,
    api_base: Option<String>,
    model: String,
}

impl CompletionClient {
    pub fn new(api_key: Option<String>, api_base: Option<String>, model: String) -> Self {
        CompletionClient {
            api_key,
            api_base,
            model,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.completion_api_key.clone(),
            config.completion_api_base.clone(),
            config.completion_model.clone(),
        )
    }

    /// Streams a completion for the given turns, grounded in `context` when
    /// one is supplied.
    ///
    /// Failures before the first chunk (empty turn list, missing credential,
    /// refused connection) come back as `Err`. Failures after streaming has
    /// started surface as a terminal `StreamChunk::Error` instead, since the
    /// caller has already committed to forwarding a stream by then.
    pub async fn stream(
        &self,
        turns: &[ChatTurn],
        context: Option<&str>,
    ) -> Result<BoxStream<'static, StreamChunk>, ChatError> {
        if turns.is_empty() {
            return Err(ChatError::Validation(
                "at least one chat turn is required".to_string(),
            ));
        }

        let api_key = self.api_key.as_deref().ok_or(ChatError::ApiKeyNotSet)?;

        let mut oai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(api_base) = &self.api_base {
            oai_config = oai_config.with_api_base(api_base);
        }
        let client: Client<OpenAIConfig> = Client::with_config(oai_config);

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: Prompts::system(context),
                ..Default::default()
            },
        ));
        for turn in turns {
            messages.push(match turn.role {
                Role::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            turn.content.clone(),
                        ),
                        ..Default::default()
                    })
                }
                Role::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessage {
                        content: Some(turn.content.clone()),
                        ..Default::default()
                    },
                ),
            });
        }

        let request = CreateChatCompletionRequest {
            messages,
            model: self.model.clone(),
            stream: Some(true),
            max_tokens: Some(2048),
            ..Default::default()
        };

        let upstream = client.chat().create_stream(request).await.map_err(|e| {
            ChatError::Unknown {
                code: None,
                message: e.to_string(),
            }
        })?;

        let deltas = upstream.map(|result| {
            result.map(|resp| {
                resp.choices
                    .first()
                    .and_then(|choice| choice.delta.content.clone())
            })
        });

        Ok(chunk_stream(deltas).boxed())
    }
}

/// Pumps upstream deltas into `StreamChunk`s: one `Text` per non-empty
/// fragment, then exactly one terminal. Role-only and empty deltas are
/// skipped. After a terminal chunk nothing further is read upstream.
fn chunk_stream<S, E>(deltas: S) -> impl Stream<Item = StreamChunk> + Send + 'static
where
    S: Stream<Item = Result<Option<String>, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    stream::unfold(Some(deltas), |state| async move {
        let mut deltas = state?;
        loop {
            match deltas.next().await {
                Some(Ok(Some(text))) if !text.is_empty() => {
                    return Some((StreamChunk::Text(text), Some(deltas)));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some((StreamChunk::Error(e.to_string()), None)),
                None => return Some((StreamChunk::Done, None)),
            }
        }
    })
}
