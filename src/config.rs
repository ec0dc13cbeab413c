//! Configuration management for xi-mcp.
//!
//! Loads config from YAML files in standard locations. Every section and
//! field has a default, so an absent or partial file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub model_id: Option<String>,
    pub stability: f32,
    pub similarity_boost: f32,
    pub timeout_secs: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key_env: "XI_API_KEY".into(),
            model_id: None,
            stability: 0.5,
            similarity_boost: 0.5,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub audio_dir: PathBuf,
    pub random_hex_len: usize,
    pub summary_words: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from(".xi"),
            random_hex_len: 5,
            summary_words: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub sample_rate: u32,
    pub buffer_ms: u32,
}

impl PlaybackConfig {
    /// Output buffer size in frames, saturating at `u32::MAX`.
    pub fn buffer_frames(&self) -> u32 {
        let frames = u64::from(self.sample_rate) * u64::from(self.buffer_ms) / 1000;
        u32::try_from(frames).unwrap_or(u32::MAX)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Sse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub transport: Transport,
    pub port: u16,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            port: 8766,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub elevenlabs: ElevenLabsConfig,
    pub storage: StorageConfig,
    pub playback: PlaybackConfig,
    pub mcp: McpConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./xi.yaml
    /// 2. ~/.config/xi-mcp/config.yaml
    /// 3. /etc/xi-mcp/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("xi.yaml")),
                dirs::home_dir().map(|h| h.join(".config/xi-mcp/config.yaml")),
                Some(PathBuf::from("/etc/xi-mcp/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::parse("storage:\n  audio_dir: /tmp/voice\nmcp:\n  transport: sse\n").unwrap();
        assert_eq!(config.storage.audio_dir, PathBuf::from("/tmp/voice"));
        assert_eq!(config.storage.summary_words, 10);
        assert_eq!(config.mcp.transport, Transport::Sse);
        assert_eq!(config.mcp.port, 8766);
        assert_eq!(config.elevenlabs.api_key_env, "XI_API_KEY");
        assert_eq!(config.playback.sample_rate, 44100);
    }

    #[test]
    fn buffer_is_a_tenth_of_a_second_by_default() {
        assert_eq!(PlaybackConfig::default().buffer_frames(), 4410);
    }

    #[test]
    fn huge_buffer_saturates_instead_of_overflowing() {
        let config = PlaybackConfig {
            sample_rate: 192_000,
            buffer_ms: u32::MAX,
        };
        assert_eq!(config.buffer_frames(), u32::MAX);

        let config = PlaybackConfig {
            sample_rate: 96_000,
            buffer_ms: 50_000,
        };
        assert_eq!(config.buffer_frames(), 4_800_000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/xi-mcp.yaml")));
        assert_eq!(config.storage.audio_dir, PathBuf::from(".xi"));
        assert_eq!(config.storage.random_hex_len, 5);
    }

    #[test]
    fn transport_names() {
        use clap::ValueEnum;
        assert_eq!(Transport::from_str("STDIO", true), Ok(Transport::Stdio));
        assert_eq!(Transport::from_str("sse", false), Ok(Transport::Sse));
        assert!(Transport::from_str("websocket", true).is_err());
    }
}
