use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use stream_cache_client::{
    verify_round_trip, ConnectionClient, DownloadConfig, DownloadEngine, PerformanceMonitor,
    UploadConfig, UploadEngine,
};

#[derive(Debug, Parser)]
#[command(name = "stream-cache-client", about = "Upload a file, download it back, verify")]
struct Cli {
    /// File to upload.
    input: PathBuf,

    /// Server URI, e.g. ws://127.0.0.1:9000/stream
    server: String,

    /// Where to write the downloaded copy. Auto-generated if omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

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
    let output_path = cli.output.unwrap_or_else(|| default_output_path(&cli.input));
    let file_size = tokio::fs::metadata(&cli.input).await?.len();
    let mut perf = PerformanceMonitor::new(file_size);

    let connection = ConnectionClient::connect(&cli.server).await?;

    perf.start_upload();
    let upload = UploadEngine::new(&connection, UploadConfig::default());
    let stream_id = upload.upload(&cli.input).await?;
    perf.end_upload();
    log::info!("uploaded '{}' as stream '{stream_id}'", cli.input.display());

    perf.start_download();
    let download = DownloadEngine::new(&connection, DownloadConfig::default());
    let bytes = download.download(&stream_id, &output_path).await?;
    perf.end_download();
    log::info!("downloaded {bytes} bytes to '{}'", output_path.display());

    connection.close().await?;

    verify_round_trip(&cli.input, &output_path).await?;
    log::info!("checksum verified: '{}' matches '{}'", cli.input.display(), output_path.display());
    log::info!("performance: {}", perf.report());

    Ok(())
}

fn default_output_path(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("download");
    let ext = input.extension().and_then(|e| e.to_str());
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let name = match ext {
        Some(ext) => format!("{stem}-{timestamp}.{ext}"),
        None => format!("{stem}-{timestamp}"),
    };
    std::path::PathBuf::from(name)
}
