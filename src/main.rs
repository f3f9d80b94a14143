//! Eyerelay Server
//!
//! Run with: cargo run -- serve
//!
//! # Configuration
//!
//! Loaded from `--config`, then the default locations (see
//! [`eyerelay::config::Config::load_default`]). Environment variables:
//! - `EYERELAY_UDP_HOST` / `EYERELAY_UDP_PORT`: Telemetry ingress (default: 0.0.0.0:7070)
//! - `EYERELAY_API_HOST` / `EYERELAY_API_PORT`: HTTP server (default: 0.0.0.0:3000)
//! - `EYERELAY_PRODUCER_URL`: Tracking process (default: http://localhost:5000)
//! - `EYERELAY_POLL_INTERVAL_MS`: Status poll interval (default: 1000)
//! - `EYERELAY_LOG_LEVEL` / `EYERELAY_LOG_FORMAT`: Logging (default: info / pretty)
//! - `RUST_LOG`: Overrides the log filter when set

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eyerelay::api::{serve, AppState};
use eyerelay::config::{generate_default_config, Config, LoggingConfig};
use eyerelay::producer::HttpProducer;
use eyerelay::session::{SessionController, StatusPoller};
use eyerelay::telemetry::{IngressListener, IngressStats};
use eyerelay::websocket::SubscriberHub;

#[derive(Parser)]
#[command(name = "eyerelay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Eye-tracking telemetry relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay (default)
    Serve {
        /// Telemetry UDP port
        #[arg(long)]
        udp_port: Option<u16>,
        /// HTTP / WebSocket port
        #[arg(short, long)]
        port: Option<u16>,
        /// Tracking process base URL
        #[arg(long)]
        producer_url: Option<String>,
    },

    /// Write a commented default config file
    InitConfig {
        /// Output path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Serve {
        udp_port: None,
        port: None,
        producer_url: None,
    });

    match command {
        Commands::InitConfig { output } => init_config(output),
        Commands::Serve {
            udp_port,
            port,
            producer_url,
        } => {
            let mut config = match &cli.config {
                Some(path) => Config::load_with_env(path)?,
                None => Config::load_default(),
            };

            if let Some(udp_port) = udp_port {
                config.ingress.port = udp_port;
            }
            if let Some(port) = port {
                config.api.port = port;
            }
            if let Some(url) = producer_url {
                config.producer.url = url;
            }

            init_logging(&config.logging);
            run(config).await
        }
    }
}

fn init_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write config to {:?}", path))?;
            println!("Wrote default config to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("eyerelay={},tower_http=info", logging.level).into()
    });

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting Eyerelay v{}", env!("CARGO_PKG_VERSION"));

    let hub = Arc::new(SubscriberHub::new(config.hub.to_hub_config()));
    let ingress_stats = Arc::new(IngressStats::new());

    // Bind once; a failure here is fatal
    let listener = IngressListener::bind(
        &config.ingress.to_listener_config(),
        Arc::clone(&hub),
        Arc::clone(&ingress_stats),
    )
    .await
    .context("Failed to bind telemetry ingress")?;
    let ingress_addr = listener.local_addr()?;

    let producer = HttpProducer::new(config.producer.to_client_config())
        .context("Failed to build tracking process client")?;
    tracing::info!("Tracking process: {}", config.producer.url);
    let session = Arc::new(SessionController::new(Arc::new(producer)));

    // Background tasks
    let ingress_handle = listener.spawn();
    let poller_handle =
        StatusPoller::new(Arc::clone(&session), config.producer.poll_interval()).spawn();
    let status_handle = Arc::clone(&hub).forward_session_status(session.subscribe());

    let state = AppState::new(
        Arc::clone(&session),
        Arc::clone(&hub),
        ingress_stats,
        config.api.clone(),
    )
    .with_ingress_addr(ingress_addr);

    let result = serve(state, &config.api).await;

    // Graceful shutdown
    tracing::info!("Stopping background tasks...");
    ingress_handle.abort();
    poller_handle.abort();
    status_handle.abort();

    result?;
    tracing::info!("Eyerelay stopped");
    Ok(())
}
