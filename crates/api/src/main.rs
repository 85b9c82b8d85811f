//! Lantern API server binary.
//!
//! Usage:
//!   lantern-api --config lantern.toml
//!   lantern-api --port 8080
//!   lantern-api --port 8080 --bind 0.0.0.0
//!
//! # Environment Variables
//!
//! - `LANTERN_BIND_ADDR` - server bind address (default: 127.0.0.1)
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` - completion provider keys

use lantern_api::{AppState, serve};
use lantern_pipeline::PipelineConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lantern_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut port: u16 = 8080;
    let mut config_path: Option<String> = None;
    let mut bind_addr: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1]
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid port number: {}", args[i + 1]))?;
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    bind_addr = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lantern API Server");
                println!();
                println!("Usage: lantern-api [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>    Port to listen on (default: 8080)");
                println!(
                    "  -b, --bind <ADDR>    Bind address (default: 127.0.0.1, env: LANTERN_BIND_ADDR)"
                );
                println!("  -c, --config <FILE>  Path to a TOML config file");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let host = bind_addr
        .or_else(|| std::env::var("LANTERN_BIND_ADDR").ok())
        .unwrap_or_else(|| "127.0.0.1".to_string());

    if host == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0 — this exposes the API to all network interfaces. \
             Ensure a firewall or reverse proxy is in place."
        );
    }

    let config = if let Some(path) = config_path {
        tracing::info!(path = %path, "Loading configuration");
        PipelineConfig::from_file(&path)?
    } else {
        tracing::info!("Using default configuration");
        PipelineConfig::default()
    };

    let state = AppState::new(config).map_err(|e| anyhow::anyhow!("{e}"))?;

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    serve(Arc::new(state), addr).await?;

    Ok(())
}
