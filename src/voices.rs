//! Voice registry: the fetched voice set and the current selection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::elevenlabs::{SpeechClient, Voice};
use crate::error::{Result, XiError};

#[derive(Debug, Clone, Default)]
pub struct VoiceSnapshot {
    pub voices: Vec<Voice>,
    pub selected: Option<Voice>,
}

#[derive(Default)]
struct RegistryState {
    voices: Vec<Voice>,
    selected: Option<Voice>,
    /// Ticket of the fetch whose listing is installed.
    generation: u64,
}

pub struct VoiceRegistry {
    client: Arc<dyn SpeechClient>,
    state: RwLock<RegistryState>,
    fetches: AtomicU64,
}

impl VoiceRegistry {
    pub fn new(client: Arc<dyn SpeechClient>) -> Self {
        Self {
            client,
            state: RwLock::new(RegistryState::default()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Replace the voice set with a fresh listing from the API.
    ///
    /// The selection is re-resolved by ID; if nothing ends up selected the
    /// first returned voice becomes the default. A failed fetch leaves the
    /// registry untouched.
    ///
    /// Overlapping refreshes are ordered by when they started: a listing
    /// that arrives after a newer one has been installed is dropped.
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let voices = self.client.list_voices().await?;

        let mut state = self.state.write().await;
        if ticket < state.generation {
            debug!("Dropping stale voice listing (fetch {ticket}, installed {})", state.generation);
            return Ok(());
        }
        state.generation = ticket;
        let selected = state
            .selected
            .as_ref()
            .and_then(|current| voices.iter().find(|v| v.id == current.id).cloned())
            .or_else(|| voices.first().cloned());

        if let (Some(old), Some(new)) = (&state.selected, &selected) {
            if old.id != new.id {
                info!("Selected voice {} disappeared, defaulting to {} ({})", old.id, new.name, new.id);
            }
        } else if let Some(new) = &selected {
            info!("Default voice: {} ({})", new.name, new.id);
        }

        debug!("Voice registry refreshed: {} voices", voices.len());
        state.voices = voices;
        state.selected = selected;
        Ok(())
    }

    pub async fn list(&self) -> VoiceSnapshot {
        let state = self.state.read().await;
        VoiceSnapshot {
            voices: state.voices.clone(),
            selected: state.selected.clone(),
        }
    }

    pub async fn selected(&self) -> Option<Voice> {
        self.state.read().await.selected.clone()
    }

    pub async fn select(&self, id: &str) -> Result<Voice> {
        let mut state = self.state.write().await;
        let voice = state
            .voices
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| XiError::VoiceNotFound(id.to_string()))?;

        info!("Voice changed to: {} ({})", voice.name, voice.id);
        state.selected = Some(voice.clone());
        Ok(voice)
    }
}
