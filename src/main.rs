use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// Added for tracing file logging
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wiredrop::session::ProgressHook;
use wiredrop::utils::format_size;
use wiredrop::{SendConfig, TlsOptions, TransferSession, TransportConfig, WsTransport};

#[derive(Parser)]
#[command(author, version, about = "Send a single file over a WebSocket connection", long_about = None)]
struct Cli {
    /// WebSocket endpoint, e.g. wss://host:8008/
    url: String,

    /// Path to the file to send
    file: PathBuf,

    /// PEM bundle with trusted root certificates
    #[arg(long)]
    ca: Option<PathBuf>,

    /// Client certificate (PEM)
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Client private key (PKCS#8 PEM)
    #[arg(long)]
    key: Option<PathBuf>,

    /// Skip certificate verification
    #[arg(long)]
    insecure: bool,

    /// Optional JSON config file with timeouts and transfer knobs
    #[arg(long)]
    config: Option<String>,
}

// Function to initialize tracing and file logging
// Returns a WorkerGuard that must be kept alive for logs to be written
fn init_logging(log_file_prefix: &str) -> Result<WorkerGuard, Box<dyn Error>> {
    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", log_file_prefix);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false); // Don't use ANSI codes in files

    let console_layer = fmt::layer().with_writer(std::io::stderr);

    // Use RUST_LOG env var, default to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // This guard needs to stay in scope, otherwise logs stop writing.
    let _guard = init_logging("wiredrop")?;

    let cli = Cli::parse();

    let config = SendConfig::load_or_default(cli.config.as_deref());
    config.validate()?;

    let mut transport_config = TransportConfig::new(&cli.url);
    transport_config.tls = TlsOptions {
        ca_file: cli.ca,
        cert_file: cli.cert,
        key_file: cli.key,
        insecure: cli.insecure,
    };
    transport_config.per_message_compression = config.per_message_compression;
    transport_config.progress_unit = config.progress_unit;

    let transport = WsTransport::new(transport_config);
    let mut session = TransferSession::new(transport, config);

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap(),
    );
    let hook_bar = bar.clone();
    let progress: ProgressHook = Box::new(move |current, total| {
        hook_bar.set_length(total);
        hook_bar.set_position(current);
        true
    });

    match session.run(&cli.file, Some(progress)).await {
        Ok(report) => {
            bar.finish_and_clear();
            info!(
                "Sent {} in {} ms ({:.2} MB/s)",
                format_size(report.bytes),
                report.elapsed_ms,
                report.rate_mb_s
            );
            Ok(())
        }
        Err(err) => {
            bar.abandon();
            Err(err.into())
        }
    }
}
