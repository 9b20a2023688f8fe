//! One on-disk file and its memory mapping.
//!
//! Grounded on the unmap-truncate-remap discipline of the fixed index
//! format: `memmap2::MmapMut` cannot be resized in place, so every grow
//! drops the existing mapping, truncates the file to the new size, and
//! maps again. Only one mapping exists at a time; no byte slice of a
//! previous mapping survives a resize.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::error::{StoreError, StoreResult};

/// Owns one cache file and its current memory mapping. Not `Clone`;
/// callers share it through `Arc<TokioMutex<StreamContext>>`.
pub struct MappedFile {
    path: PathBuf,
    file: Option<File>,
    mmap: Option<MmapMut>,
    size: u64,
}

impl MappedFile {
    /// A file handle that owns no on-disk file yet. `write`/`read`
    /// open and create it lazily, matching the stream manager's
    /// contract that `create_stream` attaches a Mapped File "not yet
    /// materialized on disk".
    pub fn unattached(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            mmap: None,
            size: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Replaces any existing file at `path`, creates parent
    /// directories, truncates to `initial_size`, and maps it if
    /// `initial_size > 0`.
    pub fn create(&mut self, initial_size: u64) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent.display().to_string(), e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;

        file.set_len(initial_size)
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;

        self.mmap = if initial_size > 0 {
            Some(unsafe {
                MmapMut::map_mut(&file).map_err(|e| StoreError::io(self.path.display().to_string(), e))?
            })
        } else {
            None
        };

        self.file = Some(file);
        self.size = initial_size;
        Ok(())
    }

    /// Opens an already-existing file at `path` and maps its current
    /// contents.
    pub fn open(&mut self) -> StoreResult<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;

        let size = file
            .metadata()
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?
            .len();

        self.mmap = if size > 0 {
            Some(unsafe {
                MmapMut::map_mut(&file).map_err(|e| StoreError::io(self.path.display().to_string(), e))?
            })
        } else {
            None
        };

        self.file = Some(file);
        self.size = size;
        Ok(())
    }

    fn ensure_open(&mut self) -> StoreResult<()> {
        if self.file.is_none() {
            if self.path.exists() {
                self.open()?;
            } else {
                self.create(0)?;
            }
        }
        Ok(())
    }

    /// Unmaps, truncates to `new_size`, and remaps. No-op when
    /// `new_size` already matches the current size.
    pub fn resize(&mut self, new_size: u64) -> StoreResult<()> {
        if new_size == self.size {
            return Ok(());
        }

        self.mmap = None; // unmap before truncate

        let file = self
            .file
            .as_ref()
            .ok_or_else(|| StoreError::io(self.path.display().to_string(), std::io::Error::new(std::io::ErrorKind::NotFound, "file not open")))?;

        file.set_len(new_size)
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;

        self.mmap = if new_size > 0 {
            Some(unsafe {
                MmapMut::map_mut(file).map_err(|e| StoreError::io(self.path.display().to_string(), e))?
            })
        } else {
            None
        };

        self.size = new_size;
        Ok(())
    }

    /// Writes `data` at `offset`, auto-creating the file if not open
    /// and auto-growing it if the write would exceed the current
    /// size. Returns the number of bytes written.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> StoreResult<usize> {
        self.ensure_open()?;

        let end = offset + data.len() as u64;
        if end > self.size {
            self.resize(end)?;
        }

        if data.is_empty() {
            return Ok(0);
        }

        let mmap = self
            .mmap
            .as_mut()
            .expect("mapping present after resize to non-zero size");

        let start = offset as usize;
        mmap[start..start + data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    /// Returns up to `min(length, size - offset)` bytes starting at
    /// `offset`. Empty when `offset >= size` (end-of-file signal).
    pub fn read(&mut self, offset: u64, length: u64) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;

        if offset >= self.size {
            return Ok(Vec::new());
        }

        let available = self.size - offset;
        let take = length.min(available) as usize;
        if take == 0 {
            return Ok(Vec::new());
        }

        let mmap = match &self.mmap {
            Some(mmap) => mmap,
            None => return Ok(Vec::new()),
        };

        let start = offset as usize;
        Ok(mmap[start..start + take].to_vec())
    }

    /// Resizes down to `final_size` and flushes. Idempotent for equal
    /// sizes.
    pub fn finalize(&mut self, final_size: u64) -> StoreResult<()> {
        self.ensure_open()?;
        self.resize(final_size)?;
        if let Some(mmap) = &self.mmap {
            mmap.flush()
                .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.mmap = None;
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stream-cache-store-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn write_auto_creates_and_grows() {
        let path = temp_path("grow");
        let _ = std::fs::remove_file(&path);
        let mut mf = MappedFile::unattached(path.clone());

        let n = mf.write(0, b"hello").unwrap();
        assert_eq!(n, 5);
        assert_eq!(mf.size(), 5);

        let n = mf.write(5, b" world").unwrap();
        assert_eq!(n, 6);
        assert_eq!(mf.size(), 11);

        let data = mf.read(0, 11).unwrap();
        assert_eq!(&data, b"hello world");

        mf.close();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_past_end_is_empty() {
        let path = temp_path("read-past-end");
        let _ = std::fs::remove_file(&path);
        let mut mf = MappedFile::unattached(path.clone());
        mf.write(0, b"abc").unwrap();

        assert_eq!(mf.read(3, 10).unwrap(), Vec::<u8>::new());
        assert_eq!(mf.read(100, 10).unwrap(), Vec::<u8>::new());

        mf.close();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn finalize_truncates_and_is_idempotent() {
        let path = temp_path("finalize");
        let _ = std::fs::remove_file(&path);
        let mut mf = MappedFile::unattached(path.clone());
        mf.write(0, &[1u8; 100]).unwrap();

        mf.finalize(40).unwrap();
        assert_eq!(mf.size(), 40);

        mf.finalize(40).unwrap();
        assert_eq!(mf.size(), 40);

        mf.close();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_write_at_zero_is_noop() {
        let path = temp_path("empty-write");
        let _ = std::fs::remove_file(&path);
        let mut mf = MappedFile::unattached(path.clone());

        let n = mf.write(0, &[]).unwrap();
        assert_eq!(n, 0);
        assert_eq!(mf.size(), 0);

        mf.close();
        let _ = std::fs::remove_file(&path);
    }
}
