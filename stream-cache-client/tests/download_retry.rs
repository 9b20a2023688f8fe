//! Simulates a server that drops the first two GET responses for a
//! range before answering, exercising the download engine's retry
//! path against a hand-rolled WebSocket peer (no stream store
//! involved: this test is only about client-side retry behavior).

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use stream_cache_api_types::ControlMessage;
use stream_cache_client::{ConnectionClient, DownloadConfig, DownloadEngine};

#[tokio::test]
async fn retries_succeed_after_two_dropped_responses() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (mut sink, mut source) = ws.split();

        let mut get_attempts = 0u32;
        while let Some(Ok(Message::Text(text))) = source.next().await {
            let msg = ControlMessage::from_json(&text).unwrap();
            if msg.get_type() == Some(stream_cache_api_types::MessageType::Get) {
                get_attempts += 1;
                if get_attempts <= 2 {
                    // Drop the response: do not reply at all, forcing the
                    // client to time out and retry.
                    continue;
                }
                if msg.offset == Some(0) {
                    sink.send(Message::Binary(b"payload!".to_vec())).await.unwrap();
                } else {
                    sink.send(Message::Text(ControlMessage::error("no data").to_json().unwrap()))
                        .await
                        .unwrap();
                }
            }
        }
    });

    let connection = ConnectionClient::connect(&format!("ws://{addr}")).await.unwrap();
    let config = DownloadConfig {
        request_timeout: Duration::from_millis(200),
        max_retries: 3,
        chunk_size: 64 * 1024,
        retry_backoff: Duration::from_millis(100),
    };
    let download = DownloadEngine::new(&connection, config);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.bin");
    let bytes = download.download("s-1", &output).await.unwrap();

    assert_eq!(bytes, 8);
    assert_eq!(tokio::fs::read(&output).await.unwrap(), b"payload!");

    server.abort();
}

#[tokio::test]
async fn retries_exhausted_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (_sink, mut source) = ws.split();
        // Never reply to anything.
        while source.next().await.is_some() {}
    });

    let connection = ConnectionClient::connect(&format!("ws://{addr}")).await.unwrap();
    let config = DownloadConfig {
        request_timeout: Duration::from_millis(50),
        max_retries: 2,
        chunk_size: 64 * 1024,
        retry_backoff: Duration::from_millis(10),
    };
    let download = DownloadEngine::new(&connection, config);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.bin");
    assert!(download.download("s-1", &output).await.is_err());

    server.abort();
}
