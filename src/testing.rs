//! Test doubles for the synthesis client and audio output.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::elevenlabs::{SpeechClient, Voice, VoiceSettings};
use crate::error::{Result, XiError};
use crate::player::AudioOutput;

pub fn voice(id: &str, name: &str) -> Voice {
    Voice {
        id: id.into(),
        name: name.into(),
        category: "premade".into(),
    }
}

/// Synthesis client returning canned voices and a fixed payload.
///
/// Listings queued with `queue_listing` are served first, in order, each
/// after its delay; afterwards every call returns the current `voices`.
pub struct FakeSpeechClient {
    voices: Mutex<std::result::Result<Vec<Voice>, String>>,
    queued: Mutex<VecDeque<(Vec<Voice>, Duration)>>,
    pub synth_calls: Mutex<Vec<(String, String, VoiceSettings)>>,
}

impl FakeSpeechClient {
    pub const AUDIO: &'static [u8] = b"ID3\x04fake-mp3";

    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices: Mutex::new(Ok(voices)),
            queued: Mutex::new(VecDeque::new()),
            synth_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.voices.lock().unwrap() = Ok(voices);
    }

    pub fn queue_listing(&self, voices: Vec<Voice>, delay: Duration) {
        self.queued.lock().unwrap().push_back((voices, delay));
    }

    pub fn fail_listing(&self, message: &str) {
        *self.voices.lock().unwrap() = Err(message.into());
    }

    pub fn voice_ids_used(&self) -> Vec<String> {
        self.synth_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl SpeechClient for FakeSpeechClient {
    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let next = self.queued.lock().unwrap().pop_front();
        if let Some((voices, delay)) = next {
            tokio::time::sleep(delay).await;
            return Ok(voices);
        }
        self.voices.lock().unwrap().clone().map_err(XiError::Upstream)
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> Result<Vec<u8>> {
        if voice_id == "broken" {
            return Err(XiError::Upstream("quota exceeded".into()));
        }
        self.synth_calls
            .lock()
            .unwrap()
            .push((text.into(), voice_id.into(), *settings));
        Ok(Self::AUDIO.to_vec())
    }
}

/// Output that "renders" by sleeping, recording start/end instants and the
/// peak number of simultaneous renders.
pub struct RecordingOutput {
    render_time: Duration,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub spans: Mutex<Vec<(PathBuf, Instant, Instant)>>,
}

impl RecordingOutput {
    pub fn new(render_time: Duration) -> Self {
        Self {
            render_time,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            spans: Mutex::new(Vec::new()),
        }
    }
}

impl AudioOutput for RecordingOutput {
    fn render(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(XiError::io(
                format!("failed to open audio file {}", path.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let start = Instant::now();
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        std::thread::sleep(self.render_time);
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.spans
            .lock()
            .unwrap()
            .push((path.to_path_buf(), start, Instant::now()));
        Ok(())
    }
}
