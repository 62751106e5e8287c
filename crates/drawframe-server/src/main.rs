//! Draw device server binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve the protocol on the default socket
//! drawframe-server --socket /tmp/draw.sock
//!
//! # Verbose protocol tracing
//! drawframe-server --log-level debug
//! ```

use clap::Parser;
use drawframe_server::{DrawDevice, DrawListener, registry};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Display-protocol server over a Unix socket
#[derive(Parser, Debug)]
#[command(name = "drawframe-server")]
#[command(about = "Display-protocol server over a Unix socket")]
#[command(version)]
struct Args {
    /// Socket path standing in for the device node
    #[arg(short, long, default_value = "/tmp/draw.sock")]
    socket: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("draw device server starting");

    let device = registry::install(DrawDevice::new())?;
    let listener = DrawListener::bind(&args.socket, device)?;
    tracing::info!(path = %listener.local_path().display(), "listening");

    let result = listener.run().await;
    registry::uninstall();
    result?;

    Ok(())
}
