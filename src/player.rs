//! Audio playback: MP3 decode via rodio, one playback at a time.
//!
//! The output device is opened once at startup with a fixed sample rate and
//! buffer size. `Player` serializes access to it with an async mutex, so a
//! second `play` waits until the first has finished rendering.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rodio::cpal::BufferSize;
use rodio::source::UniformSourceIterator;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::error::{Result, XiError};

/// A device that can render an audio file to completion.
///
/// `render` blocks the calling thread until playback has finished.
pub trait AudioOutput: Send + Sync {
    fn render(&self, path: &Path) -> Result<()>;
}

/// The process-wide speaker output.
pub struct RodioOutput {
    // Kept alive for process lifetime; dropping it closes the device.
    stream: OutputStream,
    sample_rate: u32,
}

impl RodioOutput {
    pub fn open(config: &PlaybackConfig) -> Result<Self> {
        let stream = OutputStreamBuilder::from_default_device()
            .map_err(|e| XiError::AudioDevice(format!("no default output device: {e}")))?
            .with_sample_rate(config.sample_rate)
            .with_buffer_size(BufferSize::Fixed(config.buffer_frames()))
            .open_stream_or_fallback()
            .map_err(|e| XiError::AudioDevice(format!("failed to open audio output: {e}")))?;

        // The fallback path may settle on a different rate than requested.
        let sample_rate = stream.config().sample_rate();
        if sample_rate != config.sample_rate {
            warn!(
                "Audio device refused {} Hz, using {} Hz",
                config.sample_rate, sample_rate
            );
        }
        info!(
            "Audio output opened at {} Hz ({} frame buffer requested)",
            sample_rate,
            config.buffer_frames()
        );
        Ok(Self { stream, sample_rate })
    }
}

impl AudioOutput for RodioOutput {
    fn render(&self, path: &Path) -> Result<()> {
        let source = open_source(path, self.sample_rate)?;
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

/// Open and decode `path`, resampled to `sample_rate` with its own channel
/// count.
fn open_source(
    path: &Path,
    sample_rate: u32,
) -> Result<UniformSourceIterator<Decoder<BufReader<File>>>> {
    let file = File::open(path)
        .map_err(|e| XiError::io(format!("failed to open audio file {}", path.display()), e))?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| XiError::Decode(format!("{}: {e}", path.display())))?;

    let channels = decoder.channels();
    if decoder.sample_rate() != sample_rate {
        debug!(
            "Resampling {} from {} Hz to {} Hz",
            path.display(),
            decoder.sample_rate(),
            sample_rate
        );
    }
    Ok(UniformSourceIterator::new(decoder, channels, sample_rate))
}

#[derive(Clone)]
pub struct Player {
    output: Arc<dyn AudioOutput>,
    play_lock: Arc<AsyncMutex<()>>,
}

impl Player {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            play_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Play `path` and return once rendering has completed.
    pub async fn play(&self, path: &Path) -> Result<()> {
        let _guard = self.play_lock.lock().await;
        let t0 = Instant::now();

        let output = self.output.clone();
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || output.render(&owned))
            .await
            .map_err(|e| XiError::AudioDevice(format!("playback task failed: {e}")))??;

        debug!("Played {} in {:.1}s", path.display(), t0.elapsed().as_secs_f64());
        Ok(())
    }

    /// Fire-and-forget playback.
    ///
    /// Errors are logged and never reach the caller: by the time the file
    /// is decoded, the tool call that scheduled it has already reported.
    pub fn play_async(&self, path: PathBuf) -> JoinHandle<()> {
        let player = self.clone();
        tokio::spawn(async move {
            if let Err(e) = player.play(&path).await {
                warn!("Error playing audio {}: {e}", path.display());
            }
        })
    }
}
