//! MCP server exposing ElevenLabs TTS using rmcp.
//!
//! Tools:
//! - say, read: generate speech (say also plays it)
//! - play: play an existing audio file
//! - set_voice, get_voices: voice selection
//! - history: generated files with transcript summaries

use std::fmt::Write as _;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::transport::sse_server::SseServerConfig;
use rmcp::transport::{stdio, SseServer};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::XiError;
use crate::history::{HistoryEntry, HistoryReader};
use crate::manager::AudioManager;
use crate::voices::VoiceSnapshot;

type ToolText = std::result::Result<String, XiError>;

// --- Tool parameter structs ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SayRequest {
    #[schemars(description = "Text to convert to speech")]
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadRequest {
    #[schemars(description = "Path to the text file to read and convert to speech")]
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlayRequest {
    #[schemars(description = "Path to the audio file to play")]
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetVoiceRequest {
    #[schemars(description = "ID of the voice to use")]
    pub voice_id: String,
}

// --- MCP Server handler ---

#[derive(Clone)]
pub struct XiMcp {
    manager: Arc<AudioManager>,
    history: Arc<HistoryReader>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl XiMcp {
    pub fn new(manager: Arc<AudioManager>, history: Arc<HistoryReader>) -> Self {
        Self {
            manager,
            history,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Convert text to speech, save as MP3 file, and play the audio")]
    async fn say(
        &self,
        Parameters(req): Parameters<SayRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond("say", self.say_text(&req.text).await))
    }

    #[tool(description = "Read a text file and convert it to speech, saving as MP3")]
    async fn read(
        &self,
        Parameters(req): Parameters<ReadRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond("read", self.read_text(&req.file_path).await))
    }

    #[tool(description = "Play an audio file")]
    async fn play(
        &self,
        Parameters(req): Parameters<PlayRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond("play", self.play_text(&req.file_path)))
    }

    #[tool(description = "Set the voice to use for text-to-speech generation")]
    async fn set_voice(
        &self,
        Parameters(req): Parameters<SetVoiceRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond("set_voice", self.set_voice_text(&req.voice_id).await))
    }

    #[tool(description = "Get list of available voices and show the currently selected one")]
    async fn get_voices(&self) -> Result<CallToolResult, McpError> {
        Ok(respond("get_voices", self.get_voices_text().await))
    }

    #[tool(description = "List available audio files with text summaries")]
    async fn history(&self) -> Result<CallToolResult, McpError> {
        Ok(respond("history", self.history_text()))
    }
}

impl XiMcp {
    async fn say_text(&self, text: &str) -> ToolText {
        let path = self.manager.generate_and_play(text).await?;
        Ok(format!(
            "Audio generated, saved to {}, and playing",
            path.display()
        ))
    }

    async fn read_text(&self, file_path: &str) -> ToolText {
        let path = self
            .manager
            .read_file_and_generate(&PathBuf::from(file_path))
            .await?;
        Ok(format!(
            "File '{file_path}' converted to speech and saved to: {}",
            path.display()
        ))
    }

    fn play_text(&self, file_path: &str) -> ToolText {
        let path = PathBuf::from(file_path);
        if !path.is_file() {
            return Err(XiError::io(
                format!("failed to open audio file {file_path}"),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        // Decode and device errors surface only in the log.
        self.manager.player().play_async(path);
        Ok(format!("Playing audio file: {file_path}"))
    }

    async fn set_voice_text(&self, voice_id: &str) -> ToolText {
        let voice = self.manager.voices().select(voice_id).await?;
        Ok(format!("Voice set to: {} ({})", voice.name, voice.id))
    }

    async fn get_voices_text(&self) -> ToolText {
        self.manager.voices().refresh().await?;
        Ok(format_voice_list(&self.manager.voices().list().await))
    }

    fn history_text(&self) -> ToolText {
        let entries = self.history.list()?;
        if entries.is_empty() {
            return Ok("No audio files found".to_string());
        }
        Ok(format_history(&entries))
    }
}

fn respond(tool: &str, result: ToolText) -> CallToolResult {
    match result {
        Ok(text) => {
            debug!("Tool {tool} succeeded");
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(e) => {
            warn!("Tool {tool} failed: {e}");
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}

fn format_voice_list(snapshot: &VoiceSnapshot) -> String {
    let selected_id = snapshot.selected.as_ref().map(|v| v.id.as_str());
    let mut out = String::from("Available voices:\n");

    for voice in &snapshot.voices {
        let marker = if Some(voice.id.as_str()) == selected_id { "* " } else { "  " };
        let _ = writeln!(out, "{marker}{} ({}) - {}", voice.name, voice.id, voice.category);
    }

    match &snapshot.selected {
        Some(v) => {
            let _ = write!(out, "\nCurrently selected: {} ({})", v.name, v.id);
        }
        None => out.push_str("\nNo voice currently selected"),
    }
    out
}

fn format_history(entries: &[HistoryEntry]) -> String {
    let mut out = String::from("Available audio files:\n\n");
    for entry in entries {
        let _ = write!(out, "• {}", entry.file_name);
        if let Some(created) = entry.created {
            let _ = write!(out, " [{}]", created.format("%Y-%m-%d %H:%M:%S"));
        }
        let _ = write!(out, "\n  {}\n\n", entry.summary);
    }
    out
}

#[tool_handler]
impl ServerHandler for XiMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("ElevenLabs text-to-speech. Use say to speak text, read to convert a text file, play to replay a generated file, get_voices/set_voice to choose the voice, and history to browse generated audio.".into()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: XiMcp) -> Result<(), Box<dyn std::error::Error>> {
    info!("MCP server listening on stdio");
    let service = server.serve(stdio()).await?;
    let reason = service.waiting().await?;
    info!("MCP session ended: {reason:?}");
    Ok(())
}

/// Serve MCP over SSE on localhost until Ctrl-C.
pub async fn serve_sse(server: XiMcp, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();

    let config = SseServerConfig {
        bind: addr,
        sse_path: "/sse".to_string(),
        post_path: "/message".to_string(),
        ct: CancellationToken::new(),
        sse_keep_alive: Some(Duration::from_secs(15)),
    };

    let sse_server = SseServer::serve_with_config(config).await?;
    info!("MCP SSE server listening on http://{addr}/sse");
    let ct = sse_server.with_service(move || server.clone());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down MCP SSE server");
    ct.cancel();
    Ok(())
}
