use std::sync::Arc;

use clap::Parser;

use stream_cache_server::{AppContext, Cli, ConnectionServer, ServerConfig, Shutdown};
use stream_cache_store::{BufferPool, StreamManager};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(err) = run(cli).await {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let stream_manager = StreamManager::new(&cli.cache_dir)?;
    let buffer_pool = BufferPool::new(cli.buffer_size, cli.pool_size);
    let context = Arc::new(AppContext::new(stream_manager, buffer_pool));

    let shutdown = Shutdown::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("received interrupt, shutting down");
            shutdown_signal.trigger();
        }
    });

    let config = ServerConfig {
        bind_host: cli.bind,
        port: cli.port,
        endpoint_path: cli.path,
        ..ServerConfig::default()
    };

    let server = ConnectionServer::new(config, context, shutdown);
    server.run().await
}
