use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream::{self, StreamExt};

use sage::completion::StreamChunk;
use sage::sse::forward;

fn sink() -> (Arc<Mutex<Option<String>>>, Arc<Mutex<Option<String>>>) {
    let saved = Arc::new(Mutex::new(None));
    (saved.clone(), saved)
}

#[tokio::test]
async fn relays_text_then_done_and_persists_the_full_reply() {
    let (saved, captured) = sink();

    let chunks = stream::iter(vec![
        StreamChunk::Text("Hello, ".to_string()),
        StreamChunk::Text("world.".to_string()),
        StreamChunk::Done,
    ]);

    let frames: Vec<Bytes> = forward(chunks, move |content| async move {
        *captured.lock().unwrap() = Some(content);
    })
    .map(|frame| frame.unwrap())
    .collect()
    .await;

    assert_eq!(
        frames,
        vec![
            Bytes::from_static(b"data: {\"type\":\"text\",\"content\":\"Hello, \"}\n\n"),
            Bytes::from_static(b"data: {\"type\":\"text\",\"content\":\"world.\"}\n\n"),
            Bytes::from_static(b"data: {\"type\":\"done\"}\n\n"),
        ]
    );
    assert_eq!(saved.lock().unwrap().as_deref(), Some("Hello, world."));
}

#[tokio::test]
async fn a_mid_stream_error_still_persists_the_partial_reply() {
    let (saved, captured) = sink();

    let chunks = stream::iter(vec![
        StreamChunk::Text("Partial".to_string()),
        StreamChunk::Error("connection reset".to_string()),
    ]);

    let frames: Vec<Bytes> = forward(chunks, move |content| async move {
        *captured.lock().unwrap() = Some(content);
    })
    .map(|frame| frame.unwrap())
    .collect()
    .await;

    assert_eq!(
        frames,
        vec![
            Bytes::from_static(b"data: {\"type\":\"text\",\"content\":\"Partial\"}\n\n"),
            Bytes::from_static(b"data: {\"type\":\"error\",\"error\":\"connection reset\"}\n\n"),
        ]
    );
    assert_eq!(saved.lock().unwrap().as_deref(), Some("Partial"));
}

#[tokio::test]
async fn an_error_before_any_text_persists_nothing() {
    let (saved, captured) = sink();

    let chunks = stream::iter(vec![StreamChunk::Error("boom".to_string())]);

    let frames: Vec<Bytes> = forward(chunks, move |content| async move {
        *captured.lock().unwrap() = Some(content);
    })
    .map(|frame| frame.unwrap())
    .collect()
    .await;

    assert_eq!(
        frames,
        vec![Bytes::from_static(
            b"data: {\"type\":\"error\",\"error\":\"boom\"}\n\n"
        )]
    );
    assert!(saved.lock().unwrap().is_none());
}

#[tokio::test]
async fn done_with_no_text_persists_nothing() {
    let (saved, captured) = sink();

    let chunks = stream::iter(vec![StreamChunk::Done]);

    let frames: Vec<Bytes> = forward(chunks, move |content| async move {
        *captured.lock().unwrap() = Some(content);
    })
    .map(|frame| frame.unwrap())
    .collect()
    .await;

    assert_eq!(frames, vec![Bytes::from_static(b"data: {\"type\":\"done\"}\n\n")]);
    assert!(saved.lock().unwrap().is_none());
}

#[tokio::test]
async fn upstream_ending_without_a_terminal_still_flushes_the_buffer() {
    let (saved, captured) = sink();

    let chunks = stream::iter(vec![StreamChunk::Text("orphaned".to_string())]);

    let frames: Vec<Bytes> = forward(chunks, move |content| async move {
        *captured.lock().unwrap() = Some(content);
    })
    .map(|frame| frame.unwrap())
    .collect()
    .await;

    // Only the text frame goes out; there is no synthetic terminal.
    assert_eq!(
        frames,
        vec![Bytes::from_static(
            b"data: {\"type\":\"text\",\"content\":\"orphaned\"}\n\n"
        )]
    );
    assert_eq!(saved.lock().unwrap().as_deref(), Some("orphaned"));
}

#[tokio::test]
async fn dropping_the_stream_before_a_terminal_persists_nothing() {
    let (saved, captured) = sink();

    let chunks = stream::iter(vec![
        StreamChunk::Text("Hello".to_string()),
        StreamChunk::Text(", there".to_string()),
        StreamChunk::Done,
    ]);

    let mut body = forward(chunks, move |content| async move {
        *captured.lock().unwrap() = Some(content);
    });

    // The client reads one frame and walks away.
    let first = body.next().await.unwrap().unwrap();
    assert_eq!(
        first,
        Bytes::from_static(b"data: {\"type\":\"text\",\"content\":\"Hello\"}\n\n")
    );
    drop(body);

    assert!(saved.lock().unwrap().is_none());
}
