//! Dispatches parsed control messages and raw binary frames to the
//! stream store. Binary frames bypass the control dispatch table
//! entirely; only the session's `current_stream_id` governs them.

use std::sync::Arc;

use stream_cache_api_types::{ControlMessage, MessageType};
use stream_cache_store::{StreamManager, DEFAULT_BUFFER_SIZE};

use crate::session::Session;

/// What the handler wants written back to the connection. Malformed
/// text, unknown types, and unhandled failures all become `Control`
/// ERROR frames rather than closing the connection.
pub enum HandlerResponse {
    Control(ControlMessage),
    Binary(Vec<u8>),
    /// A binary frame accepted with no reply: the wire protocol acks
    /// no frame individually while uploading.
    None,
}

pub struct MessageHandler {
    manager: Arc<StreamManager>,
}

impl MessageHandler {
    pub fn new(manager: Arc<StreamManager>) -> Self {
        Self { manager }
    }

    /// Parses `text` as a control message and dispatches it. A JSON
    /// parse failure or unrecognized `type` value both become ERROR
    /// replies; neither is treated as a transport-level problem.
    pub fn handle_text(&self, session: &mut Session, text: &str) -> HandlerResponse {
        let msg = match ControlMessage::from_json(text) {
            Ok(msg) => msg,
            Err(err) => {
                return HandlerResponse::Control(ControlMessage::error(format!(
                    "malformed control message: {err}"
                )))
            }
        };

        match msg.get_type() {
            Some(MessageType::Start) => self.handle_start(session, &msg),
            Some(MessageType::Stop) => self.handle_stop(session, &msg),
            Some(MessageType::Get) => self.handle_get(&msg),
            Some(other) => HandlerResponse::Control(ControlMessage::error(format!(
                "unhandled message type: {other}"
            ))),
            None => HandlerResponse::Control(ControlMessage::error(format!(
                "unknown message type: {}",
                msg.message_type
            ))),
        }
    }

    /// Requires a bound stream on `session`. Silent drop on failure or
    /// no binding is forbidden; both always produce an ERROR reply.
    pub fn handle_binary(&self, session: &Session, data: &[u8]) -> HandlerResponse {
        let stream_id = match session.current_stream_id() {
            Some(id) => id,
            None => {
                return HandlerResponse::Control(ControlMessage::error(
                    "no stream bound on this connection",
                ))
            }
        };

        match self.manager.write_chunk(stream_id, data) {
            Ok(()) => HandlerResponse::None,
            Err(err) => HandlerResponse::Control(ControlMessage::error(err.to_string())),
        }
    }

    fn handle_start(&self, session: &mut Session, msg: &ControlMessage) -> HandlerResponse {
        let stream_id = match &msg.stream_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                return HandlerResponse::Control(ControlMessage::error(
                    "START requires a non-empty streamId",
                ))
            }
        };

        match self.manager.create_stream(&stream_id) {
            Ok(()) => {
                session.bind(&stream_id);
                HandlerResponse::Control(ControlMessage::started(stream_id))
            }
            Err(err) => HandlerResponse::Control(ControlMessage::error(err.to_string())),
        }
    }

    fn handle_stop(&self, session: &mut Session, msg: &ControlMessage) -> HandlerResponse {
        let stream_id = match &msg.stream_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                return HandlerResponse::Control(ControlMessage::error(
                    "STOP requires a non-empty streamId",
                ))
            }
        };

        match self.manager.finalize_stream(&stream_id) {
            Ok(()) => {
                if session.current_stream_id() == Some(stream_id.as_str()) {
                    session.clear();
                }
                HandlerResponse::Control(ControlMessage::stopped(stream_id))
            }
            Err(err) => HandlerResponse::Control(ControlMessage::error(err.to_string())),
        }
    }

    fn handle_get(&self, msg: &ControlMessage) -> HandlerResponse {
        let stream_id = match &msg.stream_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                return HandlerResponse::Control(ControlMessage::error(
                    "GET requires a non-empty streamId",
                ))
            }
        };

        let offset = msg.offset.unwrap_or(0);
        let length = msg.length.unwrap_or(DEFAULT_BUFFER_SIZE as u64);

        match self.manager.read_chunk(&stream_id, offset, length) {
            Ok(bytes) if !bytes.is_empty() => HandlerResponse::Binary(bytes),
            Ok(_) => HandlerResponse::Control(ControlMessage::error("no data")),
            Err(err) => HandlerResponse::Control(ControlMessage::error(err.to_string())),
        }
    }
}
