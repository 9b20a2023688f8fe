//! Per-stream metadata. Passive data mutated only by Stream Manager and
//! Mapped File; holds no business logic of its own.

use std::path::PathBuf;
use std::time::SystemTime;

use stream_cache_api_types::StreamStatus;

use crate::mapped_file::MappedFile;

pub struct StreamContext {
    pub stream_id: String,
    pub cache_path: PathBuf,
    pub mapped_file: MappedFile,
    pub current_offset: u64,
    pub total_size: u64,
    pub created_at: SystemTime,
    pub last_accessed_at: SystemTime,
    pub status: StreamStatus,
}

impl StreamContext {
    pub fn new(stream_id: String, cache_path: PathBuf) -> Self {
        let now = SystemTime::now();
        Self {
            mapped_file: MappedFile::unattached(cache_path.clone()),
            stream_id,
            cache_path,
            current_offset: 0,
            total_size: 0,
            created_at: now,
            last_accessed_at: now,
            status: StreamStatus::Uploading,
        }
    }

    pub fn update_access_time(&mut self) {
        self.last_accessed_at = SystemTime::now();
    }

    /// A cloned, point-in-time view of this context's metadata, safe
    /// to hand back to a caller once the per-stream guard is released.
    /// Excludes the mapped file itself, which is never shared outside
    /// the registry.
    pub fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot {
            stream_id: self.stream_id.clone(),
            cache_path: self.cache_path.clone(),
            current_offset: self.current_offset,
            total_size: self.total_size,
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            status: self.status,
        }
    }
}

/// Read-only snapshot of a `StreamContext`, returned by
/// `StreamManager::get_stream`.
#[derive(Debug, Clone)]
pub struct StreamSnapshot {
    pub stream_id: String,
    pub cache_path: PathBuf,
    pub current_offset: u64,
    pub total_size: u64,
    pub created_at: SystemTime,
    pub last_accessed_at: SystemTime,
    pub status: StreamStatus,
}
