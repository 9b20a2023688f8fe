//! Connection client, upload/download engines, and checksum
//! verification for the streaming cache.

pub mod connection_client;
pub mod download_engine;
pub mod error;
pub mod performance;
pub mod upload_engine;
pub mod verification;

pub use connection_client::{BinaryOutcome, ConnectionClient, ReceivedFrame};
pub use download_engine::{DownloadConfig, DownloadEngine, DownloadProgress};
pub use error::{ClientError, ClientResult};
pub use performance::{PerformanceMonitor, PerformanceReport};
pub use upload_engine::{UploadConfig, UploadEngine};
pub use verification::{sha256_file, verify_round_trip};
