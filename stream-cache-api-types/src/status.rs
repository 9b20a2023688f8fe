use serde::{Deserialize, Serialize};

/// Lifecycle state of a stream. UPLOADING is the only state writes are
/// accepted in; READY and UPLOADING both permit reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamStatus {
    Uploading,
    Ready,
    Error,
}

impl StreamStatus {
    pub fn is_uploading(&self) -> bool {
        matches!(self, StreamStatus::Uploading)
    }
}
