//! Memory-mapped stream store: mapped files, a bounded buffer pool,
//! per-stream metadata, and the stream registry that ties them
//! together.

pub mod buffer_pool;
pub mod error;
pub mod mapped_file;
pub mod stream_context;
pub mod stream_manager;

pub use buffer_pool::{BufferPool, DEFAULT_BUFFER_SIZE, DEFAULT_POOL_SIZE};
pub use error::{StoreError, StoreResult};
pub use mapped_file::MappedFile;
pub use stream_context::{StreamContext, StreamSnapshot};
pub use stream_manager::StreamManager;
