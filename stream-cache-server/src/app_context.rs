//! Explicitly constructed application state, passed to the server at
//! boot instead of reached through a process-wide singleton. Tests can
//! build an isolated instance with its own cache directory and pool.

use std::sync::Arc;

use stream_cache_store::{BufferPool, StreamManager};

pub struct AppContext {
    pub stream_manager: Arc<StreamManager>,
    pub buffer_pool: Arc<BufferPool>,
}

impl AppContext {
    pub fn new(stream_manager: StreamManager, buffer_pool: BufferPool) -> Self {
        Self {
            stream_manager: Arc::new(stream_manager),
            buffer_pool: Arc::new(buffer_pool),
        }
    }
}
