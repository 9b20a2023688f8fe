use std::path::PathBuf;

use clap::Parser;

use stream_cache_store::{DEFAULT_BUFFER_SIZE, DEFAULT_POOL_SIZE};

#[derive(Debug, Parser)]
#[command(name = "stream-cache-server", about = "Memory-mapped streaming cache server")]
pub struct Cli {
    /// Address to bind the listening socket to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// TCP port to accept connections on.
    #[arg(long, default_value_t = 9000)]
    pub port: u16,

    /// WebSocket upgrade path clients must connect to.
    #[arg(long, default_value = "/stream")]
    pub path: String,

    /// Directory backing the mapped cache files.
    #[arg(long, default_value = "./cache")]
    pub cache_dir: PathBuf,

    /// Size in bytes of each buffer pool entry.
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Number of buffers to pre-allocate.
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: usize,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    pub verbose: bool,
}
