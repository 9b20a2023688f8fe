//! Framed send/receive facade over one WebSocket connection.
//!
//! A background task demultiplexes incoming frames into a FIFO queue
//! so `receive*` calls never race the transport's own read loop; every
//! receive is bounded by a caller-supplied deadline and a connection
//! that was merely slow to answer stays usable afterward.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use stream_cache_api_types::{ControlMessage, MessageType};

use crate::error::{ClientError, ClientResult};

pub enum ReceivedFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// What `receive_binary` found: actual bytes, or an ERROR frame that
/// the caller should read as "no more data".
pub enum BinaryOutcome {
    Data(Vec<u8>),
    NoData(String),
}

type Sink = futures::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

pub struct ConnectionClient {
    sink: Mutex<Sink>,
    inbox: Mutex<mpsc::UnboundedReceiver<ClientResult<ReceivedFrame>>>,
    reader: tokio::task::JoinHandle<()>,
}

impl Drop for ConnectionClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl ConnectionClient {
    pub async fn connect(uri: &str) -> ClientResult<Self> {
        let (ws, _response) = tokio_tungstenite::connect_async(uri)
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;

        let (sink, mut source) = ws.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let mapped = match frame {
                    Ok(Message::Text(text)) => Ok(ReceivedFrame::Text(text)),
                    Ok(Message::Binary(data)) => Ok(ReceivedFrame::Binary(data)),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => Err(ClientError::Connection(err.to_string())),
                };
                if tx.send(mapped).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            sink: Mutex::new(sink),
            inbox: Mutex::new(rx),
            reader,
        })
    }

    pub async fn close(&self) -> ClientResult<()> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))
    }

    pub async fn send_text(&self, text: impl Into<String>) -> ClientResult<()> {
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))
    }

    pub async fn send_binary(&self, data: Vec<u8>) -> ClientResult<()> {
        self.sink
            .lock()
            .await
            .send(Message::Binary(data))
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))
    }

    pub async fn send_control(&self, msg: &ControlMessage) -> ClientResult<()> {
        let text = msg
            .to_json()
            .map_err(|err| ClientError::Protocol(err.to_string()))?;
        self.send_text(text).await
    }

    /// Pops the next frame off the FIFO queue, bounded by `timeout`.
    pub async fn receive(&self, timeout: Duration) -> ClientResult<ReceivedFrame> {
        let mut inbox = self.inbox.lock().await;
        match tokio::time::timeout(timeout, inbox.recv()).await {
            Ok(Some(Ok(frame))) => Ok(frame),
            Ok(Some(Err(err))) => Err(err),
            Ok(None) => Err(ClientError::Connection("connection closed".to_string())),
            Err(_) => Err(ClientError::Timeout),
        }
    }

    pub async fn receive_text(&self, timeout: Duration) -> ClientResult<String> {
        match self.receive(timeout).await? {
            ReceivedFrame::Text(text) => Ok(text),
            ReceivedFrame::Binary(_) => Err(ClientError::Protocol(
                "expected a text frame, got binary".to_string(),
            )),
        }
    }

    pub async fn receive_control(&self, timeout: Duration) -> ClientResult<ControlMessage> {
        let text = self.receive_text(timeout).await?;
        ControlMessage::from_json(&text).map_err(|err| ClientError::Protocol(err.to_string()))
    }

    /// Drains any pending text frames before accepting a binary frame.
    /// A text frame that is an ERROR response becomes `NoData`; any
    /// other text frame is a protocol violation since nothing besides
    /// ERROR is ever sent out of band of a binary reply.
    pub async fn receive_binary(&self, timeout: Duration) -> ClientResult<BinaryOutcome> {
        match self.receive(timeout).await? {
            ReceivedFrame::Binary(data) => Ok(BinaryOutcome::Data(data)),
            ReceivedFrame::Text(text) => {
                let msg = ControlMessage::from_json(&text)
                    .map_err(|err| ClientError::Protocol(err.to_string()))?;
                match msg.get_type() {
                    Some(MessageType::Error) => {
                        Ok(BinaryOutcome::NoData(msg.message.unwrap_or_default()))
                    }
                    _ => Err(ClientError::Protocol(format!(
                        "unexpected control message while awaiting binary data: {}",
                        msg.message_type
                    ))),
                }
            }
        }
    }
}
