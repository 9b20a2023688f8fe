//! Issues sequential GETs, assembles chunks, detects end-of-stream,
//! and retries transient absences.
//!
//! End-of-stream is dual-signaled: a short read (fewer bytes than
//! requested) or an ERROR "no data" reply both terminate the download
//! cleanly. A short read at the very first offset is impossible to
//! confuse with a transient drop because retries only ever apply to
//! timeouts, never to a successfully parsed short read.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use stream_cache_api_types::ControlMessage;

use crate::connection_client::{BinaryOutcome, ConnectionClient};
use crate::error::{ClientError, ClientResult};

pub struct DownloadConfig {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub chunk_size: u64,
    pub retry_backoff: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            max_retries: 3,
            chunk_size: 64 * 1024,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

const PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Clone, Default)]
pub struct DownloadProgress {
    pub bytes: u64,
    pub total_size: Option<u64>,
    pub last_error: Option<String>,
}

impl DownloadProgress {
    /// Fraction of the download complete, when the total size is
    /// known; `None` while it is still being discovered.
    pub fn fraction(&self) -> Option<f64> {
        self.total_size
            .filter(|&total| total > 0)
            .map(|total| self.bytes as f64 / total as f64)
    }
}

pub struct DownloadEngine<'a> {
    connection: &'a ConnectionClient,
    config: DownloadConfig,
    progress: std::sync::Mutex<DownloadProgress>,
}

impl<'a> DownloadEngine<'a> {
    pub fn new(connection: &'a ConnectionClient, config: DownloadConfig) -> Self {
        Self {
            connection,
            config,
            progress: std::sync::Mutex::new(DownloadProgress::default()),
        }
    }

    pub fn progress(&self) -> DownloadProgress {
        self.progress.lock().unwrap().clone()
    }

    /// Downloads the whole of `stream_id` into `output_path`, creating
    /// the parent directory on demand. Returns the total byte count.
    pub async fn download(&self, stream_id: &str, output_path: &Path) -> ClientResult<u64> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| ClientError::io(parent.display().to_string(), err))?;
        }

        let mut out = tokio::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(output_path)
            .await
            .map_err(|err| ClientError::io(output_path.display().to_string(), err))?;

        let mut offset = 0u64;
        let mut chunks_received = 0u64;

        loop {
            let chunk = match self.fetch_chunk_with_retries(stream_id, offset).await {
                Ok(chunk) => chunk,
                Err(err) => {
                    self.progress.lock().unwrap().last_error = Some(err.to_string());
                    return Err(err);
                }
            };
            let chunk = match chunk {
                Some(bytes) => bytes,
                None => break,
            };

            let len = chunk.len() as u64;
            out.write_all(&chunk)
                .await
                .map_err(|err| ClientError::io(output_path.display().to_string(), err))?;

            offset += len;
            chunks_received += 1;
            {
                let mut progress = self.progress.lock().unwrap();
                progress.bytes = offset;
            }
            if chunks_received % PROGRESS_EVERY == 0 {
                log::info!("download {stream_id}: received {chunks_received} chunks, {offset} bytes");
            }

            if len < self.config.chunk_size {
                break;
            }
        }

        self.progress.lock().unwrap().total_size = Some(offset);

        out.flush()
            .await
            .map_err(|err| ClientError::io(output_path.display().to_string(), err))?;

        Ok(offset)
    }

    /// One range, retried up to `max_retries` on timeout. Returns
    /// `None` once the stream's end has been reached.
    async fn fetch_chunk_with_retries(
        &self,
        stream_id: &str,
        offset: u64,
    ) -> ClientResult<Option<Vec<u8>>> {
        let mut attempt = 0;
        loop {
            self.connection
                .send_control(&ControlMessage::get(stream_id, offset, self.config.chunk_size))
                .await?;

            match self.connection.receive_binary(self.config.request_timeout).await {
                Ok(BinaryOutcome::Data(bytes)) => return Ok(Some(bytes)),
                Ok(BinaryOutcome::NoData(_)) => return Ok(None),
                Err(ClientError::Timeout) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(ClientError::Timeout);
                    }
                    log::warn!(
                        "download {stream_id}: timed out at offset {offset}, retry {attempt}/{}",
                        self.config.max_retries
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
