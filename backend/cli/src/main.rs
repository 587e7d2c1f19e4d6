mod config;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use refscope_core::OcrModel;
use refscope_gateway::{start_server, GatewayState};
use refscope_vision::OllamaOcr;

use config::Config;

#[derive(Parser)]
#[command(name = "refscope")]
#[command(about = "RefScope — grounded OCR with annotated bounding boxes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the RefScope HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show whether a local RefScope server is up
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    refscope_logging::init_logging(&config.log_level, config.log_dir.as_deref().map(Path::new));

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            let url = format!("http://localhost:{}/api/health", config.port);
            match reqwest::get(&url).await {
                Ok(resp) if resp.status().is_success() => {
                    println!("RefScope is running on port {}", config.port);
                }
                _ => {
                    println!("RefScope is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        bind = %config.bind_address,
        port = config.port,
        ollama = %config.ollama_base_url,
        model = %config.model,
        "starting RefScope server"
    );

    let model: Arc<dyn OcrModel> = Arc::new(
        OllamaOcr::new()
            .with_base_url(&config.ollama_base_url)
            .with_model(&config.model),
    );

    let state = GatewayState { model };

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("invalid bind address")?;
    start_server(addr, state).await
}
