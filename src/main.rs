//! xi-mcp: ElevenLabs text-to-speech exposed as MCP tools.

mod config;
mod elevenlabs;
mod error;
mod history;
mod manager;
mod mcp_server;
mod player;
mod store;
mod voices;

#[cfg(test)]
mod testing;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Transport;
use crate::elevenlabs::{ElevenLabsClient, SpeechClient, VoiceSettings};

#[derive(Parser, Debug)]
#[command(name = "xi-mcp", about = "ElevenLabs text-to-speech MCP server")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MCP transport: stdio or sse (overrides config)
    #[arg(short, long, value_enum)]
    transport: Option<Transport>,

    /// Port for the SSE transport (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout belongs to the stdio transport, so logs go to stderr
    let filter = if args.verbose {
        EnvFilter::new("debug,rmcp=info")
    } else {
        EnvFilter::new("info,rmcp=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("xi-mcp starting");

    let mut config = config::Config::load(args.config.as_deref());
    if let Some(transport) = args.transport {
        config.mcp.transport = transport;
    }
    if let Some(port) = args.port {
        config.mcp.port = port;
    }
    info!("Audio directory: {}", config.storage.audio_dir.display());

    let client: Arc<dyn SpeechClient> = Arc::new(ElevenLabsClient::from_env(&config.elevenlabs)?);

    let registry = Arc::new(voices::VoiceRegistry::new(client.clone()));
    registry.refresh().await?;
    info!("Loaded {} voices", registry.list().await.voices.len());

    let output = player::RodioOutput::open(&config.playback)?;
    let player = player::Player::new(Arc::new(output));

    let settings = VoiceSettings {
        stability: config.elevenlabs.stability,
        similarity_boost: config.elevenlabs.similarity_boost,
    };
    let manager = Arc::new(manager::AudioManager::new(
        client,
        registry,
        store::ArtifactStore::new(&config.storage),
        player,
        settings,
    ));
    let history = Arc::new(history::HistoryReader::new(&config.storage));
    let server = mcp_server::XiMcp::new(manager, history);

    match config.mcp.transport {
        Transport::Stdio => mcp_server::serve_stdio(server).await?,
        Transport::Sse => mcp_server::serve_sse(server, config.mcp.port).await?,
    }

    Ok(())
}
