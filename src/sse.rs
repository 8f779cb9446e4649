use std::future::Future;

use actix_web::Error;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::to_string;

use crate::completion::StreamChunk;

/// The wire envelope the chat client consumes, one per SSE frame.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Text { content: String },
    Done,
    Error { error: String },
}

/// Frames one event as `data: <json>\n\n`. Clients split on the blank line,
/// so the framing has to be byte-exact.
pub fn frame(event: &StreamEvent) -> Result<Bytes, Error> {
    to_string(event)
        .map_err(actix_web::error::ErrorInternalServerError)
        .map(|json| Bytes::from(format!("data: {}\n\n", json)))
}

/// Adapts a completion chunk stream into the outbound SSE body.
///
/// Text chunks are re-emitted immediately and accumulated; when the stream
/// ends (a terminal chunk, or upstream exhaustion without one) the
/// accumulated text — partial or complete — is handed to `persist` before the
/// final frame goes out. `persist` runs at most once and never runs when the
/// buffer is empty. If the client disconnects mid-stream this whole stream is
/// dropped before any terminal arrives, so nothing is persisted on that path
/// and the drop cancels the upstream request.
pub fn forward<S, F, Fut>(chunks: S, persist: F) -> BoxStream<'static, Result<Bytes, Error>>
where
    S: Stream<Item = StreamChunk> + Send + Unpin + 'static,
    F: FnOnce(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    struct Forward<S, F> {
        chunks: Option<S>,
        buffer: String,
        persist: Option<F>,
    }

    let state = Forward {
        chunks: Some(chunks),
        buffer: String::new(),
        persist: Some(persist),
    };

    stream::unfold(state, |mut st| async move {
        let mut chunks = st.chunks.take()?;
        match chunks.next().await {
            Some(StreamChunk::Text(text)) => {
                st.buffer.push_str(&text);
                st.chunks = Some(chunks);
                Some((frame(&StreamEvent::Text { content: text }), st))
            }
            Some(StreamChunk::Done) => {
                flush(&mut st.buffer, &mut st.persist).await;
                Some((frame(&StreamEvent::Done), st))
            }
            Some(StreamChunk::Error(error)) => {
                flush(&mut st.buffer, &mut st.persist).await;
                Some((frame(&StreamEvent::Error { error }), st))
            }
            // Upstream ended without a terminal chunk; flush what we have.
            None => {
                flush(&mut st.buffer, &mut st.persist).await;
                None
            }
        }
    })
    .boxed()
}

async fn flush<F, Fut>(buffer: &mut String, persist: &mut Option<F>)
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = ()>,
{
    if buffer.is_empty() {
        return;
    }
    if let Some(persist) = persist.take() {
        persist(std::mem::take(buffer)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_is_byte_exact() {
        let bytes = frame(&StreamEvent::Text {
            content: "Hello, ".to_string(),
        })
        .unwrap();
        assert_eq!(
            bytes,
            Bytes::from_static(b"data: {\"type\":\"text\",\"content\":\"Hello, \"}\n\n")
        );
    }

    #[test]
    fn done_frame_is_byte_exact() {
        let bytes = frame(&StreamEvent::Done).unwrap();
        assert_eq!(bytes, Bytes::from_static(b"data: {\"type\":\"done\"}\n\n"));
    }

    #[test]
    fn error_frame_is_byte_exact() {
        let bytes = frame(&StreamEvent::Error {
            error: "upstream failed".to_string(),
        })
        .unwrap();
        assert_eq!(
            bytes,
            Bytes::from_static(b"data: {\"type\":\"error\",\"error\":\"upstream failed\"}\n\n")
        );
    }
}
