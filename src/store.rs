//! Artifact store: `<millis>-<hex>.mp3` audio plus a `.txt` transcript of
//! the same base name.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{Result, XiError};

pub const AUDIO_EXT: &str = "mp3";
pub const TRANSCRIPT_EXT: &str = "txt";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    hex_len: usize,
}

impl ArtifactStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            dir: config.audio_dir.clone(),
            hex_len: config.random_hex_len,
        }
    }

    /// Write the audio payload and its transcript, returning the audio path.
    ///
    /// The audio file is written first; if the transcript write then fails
    /// the orphaned audio stays on disk.
    pub fn persist(&self, transcript: &str, audio: &[u8]) -> Result<PathBuf> {
        let base = base_name(self.hex_len);
        let audio_path = self.dir.join(format!("{base}.{AUDIO_EXT}"));
        let text_path = transcript_path(&audio_path);

        fs::create_dir_all(&self.dir).map_err(|e| {
            XiError::io(format!("failed to create directory {}", self.dir.display()), e)
        })?;
        fs::write(&audio_path, audio).map_err(|e| {
            XiError::io(format!("failed to write audio file {}", audio_path.display()), e)
        })?;
        fs::write(&text_path, transcript).map_err(|e| {
            XiError::io(format!("failed to write text file {}", text_path.display()), e)
        })?;

        debug!("Saved {} bytes to {}", audio.len(), audio_path.display());
        Ok(audio_path)
    }
}

/// The transcript path that belongs to an audio path.
pub fn transcript_path(audio_path: &Path) -> PathBuf {
    audio_path.with_extension(TRANSCRIPT_EXT)
}

fn base_name(hex_len: usize) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), random_hex(hex_len))
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    OsRng.fill_bytes(&mut bytes);
    let mut hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(len);
    hex
}
