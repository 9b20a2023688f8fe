//! Drives START -> chunked binary -> STOP with pacing and progress.
//!
//! The server acknowledges no individual binary frame, so `upload_delay`
//! paces the sender and bounds how many bytes can be in flight at once.
//! A future protocol revision could replace this with credit-based flow
//! control, but it would have to stay wire-compatible with what the
//! server accepts today.

use std::path::Path;
use std::time::Duration;

use stream_cache_api_types::{ControlMessage, MessageType, StreamIdGenerator};
use tokio::io::AsyncReadExt;

use crate::connection_client::ConnectionClient;
use crate::error::{ClientError, ClientResult};

pub struct UploadConfig {
    pub response_timeout: Duration,
    pub upload_delay: Duration,
    pub inter_phase_pause: Duration,
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            upload_delay: Duration::from_millis(10),
            inter_phase_pause: Duration::from_millis(500),
            chunk_size: 64 * 1024,
        }
    }
}

const PROGRESS_EVERY: u64 = 100;

pub struct UploadEngine<'a> {
    connection: &'a ConnectionClient,
    config: UploadConfig,
}

impl<'a> UploadEngine<'a> {
    pub fn new(connection: &'a ConnectionClient, config: UploadConfig) -> Self {
        Self { connection, config }
    }

    /// Uploads `input_path`'s contents as a fresh stream and returns
    /// the stream id the server assigned.
    pub async fn upload(&self, input_path: &Path) -> ClientResult<String> {
        let mut file = tokio::fs::File::open(input_path)
            .await
            .map_err(|err| ClientError::io(input_path.display().to_string(), err))?;

        let stream_id = StreamIdGenerator::new().generate_short();

        self.connection
            .send_control(&ControlMessage::start(&stream_id))
            .await?;

        let reply = self
            .connection
            .receive_control(self.config.response_timeout)
            .await?;
        if reply.get_type() != Some(MessageType::Started) {
            return Err(ClientError::Protocol(format!(
                "expected STARTED, got {}",
                reply.message_type
            )));
        }

        tokio::time::sleep(self.config.inter_phase_pause).await;

        let mut buf = vec![0u8; self.config.chunk_size];
        let mut chunks_sent: u64 = 0;
        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|err| ClientError::io(input_path.display().to_string(), err))?;
            if n == 0 {
                break;
            }

            self.connection.send_binary(buf[..n].to_vec()).await?;
            chunks_sent += 1;
            if chunks_sent % PROGRESS_EVERY == 0 {
                log::info!("upload {stream_id}: sent {chunks_sent} chunks");
            }

            tokio::time::sleep(self.config.upload_delay).await;
        }

        tokio::time::sleep(self.config.inter_phase_pause).await;

        self.connection
            .send_control(&ControlMessage::stop(&stream_id))
            .await?;

        match self
            .connection
            .receive_control(self.config.response_timeout)
            .await
        {
            Ok(reply) if reply.get_type() == Some(MessageType::Stopped) => {}
            Ok(reply) => log::warn!(
                "upload {stream_id}: expected STOPPED, got {} (upload already complete)",
                reply.message_type
            ),
            Err(ClientError::Timeout) => {
                log::warn!("upload {stream_id}: timed out waiting for STOPPED (upload already complete)");
            }
            Err(err) => return Err(err),
        }

        Ok(stream_id)
    }
}
