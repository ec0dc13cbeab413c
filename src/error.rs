//! Error taxonomy shared by the voice registry, artifact store, player and
//! MCP tools.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XiError {
    #[error("no voice selected")]
    NoVoiceSelected,

    #[error("voice with ID '{0}' not found")]
    VoiceNotFound(String),

    #[error("ElevenLabs API error: {0}")]
    Upstream(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("audio output error: {0}")]
    AudioDevice(String),

    #[error("{0} environment variable is required")]
    MissingApiKey(String),
}

impl XiError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, XiError>;
