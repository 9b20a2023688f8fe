//! End-to-end scenarios against a real server over a loopback
//! WebSocket connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use stream_cache_client::{ConnectionClient, DownloadConfig, DownloadEngine, UploadConfig, UploadEngine};
use stream_cache_server::{AppContext, ConnectionServer, ServerConfig, Shutdown};
use stream_cache_store::{BufferPool, StreamManager};

async fn spawn_server() -> (String, Shutdown, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let manager = StreamManager::new(dir.path()).unwrap();
    let pool = BufferPool::default();
    let context = Arc::new(AppContext::new(manager, pool));
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig::default();
    let endpoint_path = config.endpoint_path.clone();
    let server = ConnectionServer::new(config, context, shutdown.clone());
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    (format!("ws://{addr}{endpoint_path}"), shutdown, dir)
}

#[tokio::test]
async fn round_trip_small_file() {
    let (uri, _shutdown, dir) = spawn_server().await;

    let input = dir.path().join("in.bin");
    tokio::fs::write(&input, [0x41u8]).await.unwrap();
    let output = dir.path().join("out.bin");

    let connection = ConnectionClient::connect(&uri).await.unwrap();
    let upload = UploadEngine::new(&connection, UploadConfig::default());
    let stream_id = upload.upload(&input).await.unwrap();

    let download = DownloadEngine::new(&connection, DownloadConfig::default());
    let bytes = download.download(&stream_id, &output).await.unwrap();
    assert_eq!(bytes, 1);

    let written = tokio::fs::read(&output).await.unwrap();
    assert_eq!(written, vec![0x41u8]);
}

#[tokio::test]
async fn round_trip_multi_chunk() {
    let (uri, _shutdown, dir) = spawn_server().await;

    let input = dir.path().join("in.bin");
    let data: Vec<u8> = (0..131072u32).map(|i| (i % 256) as u8).collect();
    tokio::fs::write(&input, &data).await.unwrap();
    let output = dir.path().join("out.bin");

    let connection = ConnectionClient::connect(&uri).await.unwrap();
    let upload = UploadEngine::new(&connection, UploadConfig::default());
    let stream_id = upload.upload(&input).await.unwrap();

    let download = DownloadEngine::new(&connection, DownloadConfig::default());
    let bytes = download.download(&stream_id, &output).await.unwrap();
    assert_eq!(bytes, 131072);

    let written = tokio::fs::read(&output).await.unwrap();
    assert_eq!(written, data);
}

#[tokio::test]
async fn end_exactly_on_chunk_boundary() {
    let (uri, _shutdown, dir) = spawn_server().await;

    let input = dir.path().join("in.bin");
    let data = vec![7u8; 65536];
    tokio::fs::write(&input, &data).await.unwrap();
    let output = dir.path().join("out.bin");

    let connection = ConnectionClient::connect(&uri).await.unwrap();
    let upload = UploadEngine::new(&connection, UploadConfig::default());
    let stream_id = upload.upload(&input).await.unwrap();

    let download = DownloadEngine::new(&connection, DownloadConfig::default());
    let bytes = download.download(&stream_id, &output).await.unwrap();
    assert_eq!(bytes, 65536);
}

#[tokio::test]
async fn concurrent_streams_do_not_interfere() {
    let (uri, _shutdown, dir) = spawn_server().await;

    let input_a = dir.path().join("a.bin");
    let input_b = dir.path().join("b.bin");
    tokio::fs::write(&input_a, vec![1u8; 5000]).await.unwrap();
    tokio::fs::write(&input_b, vec![2u8; 7000]).await.unwrap();

    let conn_a = ConnectionClient::connect(&uri).await.unwrap();
    let conn_b = ConnectionClient::connect(&uri).await.unwrap();

    let upload_a = UploadEngine::new(&conn_a, UploadConfig::default());
    let upload_b = UploadEngine::new(&conn_b, UploadConfig::default());

    let (id_a, id_b) = tokio::join!(upload_a.upload(&input_a), upload_b.upload(&input_b));
    let id_a = id_a.unwrap();
    let id_b = id_b.unwrap();
    assert_ne!(id_a, id_b);

    let output_a = dir.path().join("out-a.bin");
    let output_b = dir.path().join("out-b.bin");
    let download_a = DownloadEngine::new(&conn_a, DownloadConfig::default());
    let download_b = DownloadEngine::new(&conn_b, DownloadConfig::default());

    download_a.download(&id_a, &output_a).await.unwrap();
    download_b.download(&id_b, &output_b).await.unwrap();

    assert_eq!(tokio::fs::read(&output_a).await.unwrap(), vec![1u8; 5000]);
    assert_eq!(tokio::fs::read(&output_b).await.unwrap(), vec![2u8; 7000]);
}

#[tokio::test]
async fn bad_protocol_keeps_connection_open() {
    let (uri, _shutdown, _dir) = spawn_server().await;

    let connection = ConnectionClient::connect(&uri).await.unwrap();
    connection.send_text(r#"{"type":"PING"}"#).await.unwrap();

    let reply = connection
        .receive_control(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(reply.message_type, "ERROR");

    connection
        .send_control(&stream_cache_api_types::ControlMessage::start("s-after-bad-protocol"))
        .await
        .unwrap();
    let reply = connection
        .receive_control(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(reply.message_type, "STARTED");
}

#[tokio::test]
async fn upload_of_missing_file_is_fatal_before_start() {
    let (uri, _shutdown, dir) = spawn_server().await;

    let connection = ConnectionClient::connect(&uri).await.unwrap();
    let upload = UploadEngine::new(&connection, UploadConfig::default());

    let missing = dir.path().join("does-not-exist.bin");
    assert!(upload.upload(&missing).await.is_err());
}
