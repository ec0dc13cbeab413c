//! Audio lifecycle: text -> synthesized MP3 -> artifact on disk -> playback.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::elevenlabs::{SpeechClient, VoiceSettings};
use crate::error::{Result, XiError};
use crate::player::Player;
use crate::store::ArtifactStore;
use crate::voices::VoiceRegistry;

pub struct AudioManager {
    client: Arc<dyn SpeechClient>,
    voices: Arc<VoiceRegistry>,
    store: ArtifactStore,
    player: Player,
    settings: VoiceSettings,
}

impl AudioManager {
    pub fn new(
        client: Arc<dyn SpeechClient>,
        voices: Arc<VoiceRegistry>,
        store: ArtifactStore,
        player: Player,
        settings: VoiceSettings,
    ) -> Self {
        Self {
            client,
            voices,
            store,
            player,
            settings,
        }
    }

    pub fn voices(&self) -> &VoiceRegistry {
        &self.voices
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Synthesize `text` with the selected voice and save it, returning the
    /// path of the audio file.
    pub async fn generate(&self, text: &str) -> Result<PathBuf> {
        let voice = self.voices.selected().await.ok_or(XiError::NoVoiceSelected)?;

        let t0 = Instant::now();
        let audio = self.client.synthesize(text, &voice.id, &self.settings).await?;
        let path = self.store.persist(text, &audio)?;

        info!(
            "Generated {} ({} chars, voice {}) in {:.0}ms",
            path.display(),
            text.chars().count(),
            voice.name,
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(path)
    }

    /// Generate, then start playback in the background. Playback failures
    /// are logged by the player and do not affect the returned path.
    pub async fn generate_and_play(&self, text: &str) -> Result<PathBuf> {
        let path = self.generate(text).await?;
        self.player.play_async(path.clone());
        Ok(path)
    }

    pub async fn read_file_and_generate(&self, path: &Path) -> Result<PathBuf> {
        let text = fs::read_to_string(path)
            .map_err(|e| XiError::io(format!("failed to read file {}", path.display()), e))?;
        self.generate(&text).await
    }
}
