//! Process-wide registry of live streams.
//!
//! Two-level locking: the registry guard serializes id -> context
//! lookups/inserts/removals and is released before any Mapped File
//! work begins; the per-stream guard then serializes every operation
//! against that one stream, matching Mapped File's requirement that
//! writers and readers never overlap a resize.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use stream_cache_api_types::StreamStatus;

use crate::error::{StoreError, StoreResult};
use crate::stream_context::{StreamContext, StreamSnapshot};

pub struct StreamManager {
    cache_directory: PathBuf,
    registry: Mutex<HashMap<String, Arc<Mutex<StreamContext>>>>,
}

impl StreamManager {
    pub fn new(cache_directory: impl Into<PathBuf>) -> StoreResult<Self> {
        let cache_directory = cache_directory.into();
        std::fs::create_dir_all(&cache_directory)
            .map_err(|e| StoreError::io(cache_directory.display().to_string(), e))?;

        Ok(Self {
            cache_directory,
            registry: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache_directory(&self) -> &std::path::Path {
        &self.cache_directory
    }

    fn cache_path(&self, stream_id: &str) -> PathBuf {
        self.cache_directory.join(format!("{stream_id}.cache"))
    }

    /// Fails if `id` is already registered. The Mapped File attached to
    /// the new context is not yet materialized on disk; it opens its
    /// backing file lazily on the first `write_chunk`.
    pub fn create_stream(&self, stream_id: &str) -> StoreResult<()> {
        let mut registry = self.registry.lock().unwrap();
        if registry.contains_key(stream_id) {
            return Err(StoreError::AlreadyExists(stream_id.to_string()));
        }

        let context = StreamContext::new(stream_id.to_string(), self.cache_path(stream_id));
        registry.insert(stream_id.to_string(), Arc::new(Mutex::new(context)));
        Ok(())
    }

    /// Registry lookup; refreshes `last_accessed_at` on hit. Returns
    /// the shared handle so callers can take the per-stream guard
    /// themselves after releasing the registry guard.
    fn lookup(&self, stream_id: &str) -> StoreResult<Arc<Mutex<StreamContext>>> {
        let registry = self.registry.lock().unwrap();
        let entry = registry
            .get(stream_id)
            .ok_or_else(|| StoreError::NotFound(stream_id.to_string()))?
            .clone();
        drop(registry);
        entry.lock().unwrap().update_access_time();
        Ok(entry)
    }

    pub fn get_stream_status(&self, stream_id: &str) -> StoreResult<StreamStatus> {
        let entry = self.lookup(stream_id)?;
        let guard = entry.lock().unwrap();
        Ok(guard.status)
    }

    /// Registry lookup returning a cloned metadata snapshot, or `None`
    /// if no stream is registered under `stream_id`. Refreshes
    /// `last_accessed_at` on hit, same as every other lookup.
    pub fn get_stream(&self, stream_id: &str) -> Option<StreamSnapshot> {
        let entry = self.lookup(stream_id).ok()?;
        let guard = entry.lock().unwrap();
        Some(guard.snapshot())
    }

    pub fn stream_exists(&self, stream_id: &str) -> bool {
        self.registry.lock().unwrap().contains_key(stream_id)
    }

    /// Closes the mapped file, unlinks the cache file, and removes the
    /// stream from the registry. Non-existent id is not-ok.
    pub fn delete_stream(&self, stream_id: &str) -> StoreResult<()> {
        let entry = {
            let mut registry = self.registry.lock().unwrap();
            registry
                .remove(stream_id)
                .ok_or_else(|| StoreError::NotFound(stream_id.to_string()))?
        };

        let mut context = entry.lock().unwrap();
        context.mapped_file.close();
        if context.cache_path.exists() {
            std::fs::remove_file(&context.cache_path)
                .map_err(|e| StoreError::io(context.cache_path.display().to_string(), e))?;
        }
        Ok(())
    }

    pub fn list_active_streams(&self) -> Vec<String> {
        self.registry.lock().unwrap().keys().cloned().collect()
    }

    /// Requires status = UPLOADING. Writes at `current_offset`,
    /// advancing both `current_offset` and `total_size` by the number
    /// of bytes written. A partial write marks the stream ERROR.
    pub fn write_chunk(&self, stream_id: &str, data: &[u8]) -> StoreResult<()> {
        let entry = self.lookup(stream_id)?;
        let mut context = entry.lock().unwrap();

        if !context.status.is_uploading() {
            return Err(StoreError::NotUploading(stream_id.to_string()));
        }

        let offset = context.current_offset;
        let result = context.mapped_file.write(offset, data);

        match result {
            Ok(written) if written == data.len() => {
                context.current_offset += written as u64;
                context.total_size = context.current_offset;
                context.update_access_time();
                Ok(())
            }
            Ok(written) => {
                context.status = StreamStatus::Error;
                Err(StoreError::PartialWrite {
                    stream_id: stream_id.to_string(),
                    written,
                    requested: data.len(),
                })
            }
            Err(err) => {
                context.status = StreamStatus::Error;
                Err(err)
            }
        }
    }

    /// Delegates to Mapped File `read`; an empty result is a valid
    /// end-of-stream signal rather than a failure.
    pub fn read_chunk(&self, stream_id: &str, offset: u64, length: u64) -> StoreResult<Vec<u8>> {
        let entry = self.lookup(stream_id)?;
        let mut context = entry.lock().unwrap();

        let result = context.mapped_file.read(offset, length);
        match result {
            Ok(bytes) => {
                context.update_access_time();
                Ok(bytes)
            }
            Err(err) => {
                context.status = StreamStatus::Error;
                Err(err)
            }
        }
    }

    /// Requires status = UPLOADING. Truncates and flushes the backing
    /// file to `total_size`, then transitions to READY.
    pub fn finalize_stream(&self, stream_id: &str) -> StoreResult<()> {
        let entry = self.lookup(stream_id)?;
        let mut context = entry.lock().unwrap();

        if !context.status.is_uploading() {
            return Err(StoreError::NotUploading(stream_id.to_string()));
        }

        let total_size = context.total_size;
        match context.mapped_file.finalize(total_size) {
            Ok(()) => {
                context.status = StreamStatus::Ready;
                context.update_access_time();
                Ok(())
            }
            Err(err) => {
                context.status = StreamStatus::Error;
                Err(err)
            }
        }
    }

    /// Deletes every stream whose `last_accessed_at` is older than
    /// `now - max_age`. Long-lived downloads keep refreshing the
    /// access time, so they are never swept.
    pub fn cleanup_old_streams(&self, max_age: Duration) -> usize {
        let now = SystemTime::now();
        let stale: Vec<String> = {
            let registry = self.registry.lock().unwrap();
            registry
                .iter()
                .filter_map(|(id, ctx)| {
                    let last = ctx.lock().unwrap().last_accessed_at;
                    let age = now.duration_since(last).unwrap_or(Duration::ZERO);
                    (age > max_age).then(|| id.clone())
                })
                .collect()
        };

        let mut removed = 0;
        for id in stale {
            if self.delete_stream(&id).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (StreamManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = StreamManager::new(dir.path()).unwrap();
        (mgr, dir)
    }

    #[test]
    fn create_twice_without_delete_fails() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        assert!(mgr.create_stream("s-1").is_err());
    }

    #[test]
    fn write_then_read_round_trips() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        mgr.write_chunk("s-1", b"hello").unwrap();
        mgr.write_chunk("s-1", b" world").unwrap();
        mgr.finalize_stream("s-1").unwrap();

        let data = mgr.read_chunk("s-1", 0, 11).unwrap();
        assert_eq!(&data, b"hello world");
    }

    #[test]
    fn read_past_total_size_is_empty() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        mgr.write_chunk("s-1", b"abc").unwrap();
        assert_eq!(mgr.read_chunk("s-1", 3, 10).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn write_after_finalize_fails() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        mgr.write_chunk("s-1", b"abc").unwrap();
        mgr.finalize_stream("s-1").unwrap();
        assert!(mgr.write_chunk("s-1", b"more").is_err());
    }

    #[test]
    fn delete_removes_from_registry_and_disk() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        mgr.write_chunk("s-1", b"abc").unwrap();
        let path = mgr.cache_path("s-1");

        mgr.delete_stream("s-1").unwrap();
        assert!(!path.exists());
        assert!(mgr.get_stream("s-1").is_none());
        assert!(!mgr.list_active_streams().contains(&"s-1".to_string()));
    }

    #[test]
    fn get_stream_reflects_written_metadata() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        mgr.write_chunk("s-1", b"hello").unwrap();

        let snapshot = mgr.get_stream("s-1").unwrap();
        assert_eq!(snapshot.stream_id, "s-1");
        assert_eq!(snapshot.current_offset, 5);
        assert_eq!(snapshot.total_size, 5);
        assert!(snapshot.status.is_uploading());

        assert!(mgr.get_stream("does-not-exist").is_none());
    }

    #[test]
    fn empty_write_at_zero_leaves_cursor_unchanged() {
        let (mgr, _dir) = manager();
        mgr.create_stream("s-1").unwrap();
        mgr.write_chunk("s-1", b"").unwrap();
        assert_eq!(mgr.read_chunk("s-1", 0, 10).unwrap(), Vec::<u8>::new());
    }
}
