//! Control message schema shared by client and server.
//!
//! Encoded as a flat JSON object; absent optional fields are omitted
//! from the wire representation rather than serialized as `null`, and
//! `type` parses case-insensitively but is always emitted uppercase.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Start,
    Started,
    Stop,
    Stopped,
    Get,
    Error,
    Connected,
}

impl MessageType {
    /// Case-insensitive parse, matching the protocol's acceptance of
    /// lower- or mixed-case `type` values on input.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "START" => Some(MessageType::Start),
            "STARTED" => Some(MessageType::Started),
            "STOP" => Some(MessageType::Stop),
            "STOPPED" => Some(MessageType::Stopped),
            "GET" => Some(MessageType::Get),
            "ERROR" => Some(MessageType::Error),
            "CONNECTED" => Some(MessageType::Connected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Start => "START",
            MessageType::Started => "STARTED",
            MessageType::Stop => "STOP",
            MessageType::Stopped => "STOPPED",
            MessageType::Get => "GET",
            MessageType::Error => "ERROR",
            MessageType::Connected => "CONNECTED",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A control (text) frame. `message_type` is kept as a raw string on
/// the wire struct so a malformed or unknown type can still be parsed
/// far enough to report a descriptive error, but every constructor
/// below only ever produces the five known variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(rename = "streamId", skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ControlMessage {
    pub fn get_type(&self) -> Option<MessageType> {
        MessageType::parse(&self.message_type)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn start(stream_id: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Start.to_string(),
            stream_id: Some(stream_id.into()),
            offset: None,
            length: None,
            message: None,
        }
    }

    pub fn stop(stream_id: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Stop.to_string(),
            stream_id: Some(stream_id.into()),
            offset: None,
            length: None,
            message: None,
        }
    }

    pub fn get(stream_id: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            message_type: MessageType::Get.to_string(),
            stream_id: Some(stream_id.into()),
            offset: Some(offset),
            length: Some(length),
            message: None,
        }
    }

    pub fn started(stream_id: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Started.to_string(),
            stream_id: Some(stream_id.into()),
            offset: None,
            length: None,
            message: Some("Stream started successfully".to_string()),
        }
    }

    pub fn stopped(stream_id: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Stopped.to_string(),
            stream_id: Some(stream_id.into()),
            offset: None,
            length: None,
            message: Some("Stream finalized successfully".to_string()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Error.to_string(),
            stream_id: None,
            offset: None,
            length: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_not_nulled() {
        let msg = ControlMessage::start("stream-deadbeef");
        let json = msg.to_json().unwrap();
        assert!(!json.contains("null"));
        assert!(json.contains("\"streamId\":\"stream-deadbeef\""));
    }

    #[test]
    fn type_parsing_is_case_insensitive() {
        let msg = ControlMessage::from_json(r#"{"type":"start","streamId":"s-1"}"#).unwrap();
        assert_eq!(msg.get_type(), Some(MessageType::Start));
    }

    #[test]
    fn output_is_always_uppercase() {
        let msg = ControlMessage::started("stream-1");
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"STARTED\""));
    }

    #[test]
    fn unknown_type_parses_to_none() {
        let msg = ControlMessage::from_json(r#"{"type":"PING"}"#).unwrap();
        assert_eq!(msg.get_type(), None);
    }

    #[test]
    fn get_defaults_are_applied_by_caller_not_the_model() {
        let msg = ControlMessage::from_json(r#"{"type":"GET","streamId":"s-1"}"#).unwrap();
        assert_eq!(msg.offset, None);
        assert_eq!(msg.length, None);
    }
}
