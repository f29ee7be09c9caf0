use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wavestream_server::{termination_signal, DeviceRegistry, ServerConfig, WavestreamServer};

#[derive(Parser)]
#[command(name = "wavestream-server")]
#[command(about = "Demo server streaming synthetic sine and square datastreams")]
struct Args {
    /// Address serving both the REST listing and the WebSocket stream
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// The only origin allowed to make cross-origin requests
    #[arg(long, default_value = "http://localhost:4200")]
    allowed_origin: String,

    /// Seconds to wait for streaming sessions to close on shutdown
    #[arg(long, default_value = "5")]
    drain_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,wavestream_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!("Wavestream server starting...");

    let config = ServerConfig {
        bind_addr: args.bind,
        allowed_origin: args.allowed_origin,
        drain_timeout: Duration::from_secs(args.drain_timeout_secs),
    };

    let registry = DeviceRegistry::demo();
    for device in registry.list() {
        tracing::info!(
            "   Datastream {} ({}) rgb({}, {}, {})",
            device.identifier,
            device.signal_type,
            device.color.r,
            device.color.g,
            device.color.b
        );
    }

    let port = config.bind_addr.port();
    let server = WavestreamServer::new(config, registry);

    tracing::info!("Server running on port {} (HTTP & WebSocket)", port);
    tracing::info!("   Devices:   http://localhost:{}/v1/get_devices", port);
    tracing::info!("   WebSocket: ws://localhost:{}/v1/subscribe_ws", port);
    tracing::info!("");
    tracing::info!("Try these commands:");
    tracing::info!("   curl http://localhost:{}/v1/get_devices", port);
    tracing::info!("   websocat ws://localhost:{}/v1/subscribe_ws", port);
    tracing::info!("   then send: 1002345 299345 10 json");

    // Serve until SIGINT/SIGTERM
    server.run(termination_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
