//! Generated-audio history.
//!
//! There is no index: every query rescans the artifact directory and pairs
//! each `.mp3` with the summary of its `.txt` transcript.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{Result, XiError};
use crate::store::{transcript_path, AUDIO_EXT};

pub const NO_SUMMARY: &str = "(no text summary available)";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub file_name: String,
    pub summary: String,
    /// Creation time recovered from the timestamp prefix of the file name.
    pub created: Option<DateTime<Local>>,
}

pub struct HistoryReader {
    dir: PathBuf,
    summary_words: usize,
}

impl HistoryReader {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            dir: config.audio_dir.clone(),
            summary_words: config.summary_words,
        }
    }

    /// List audio artifacts sorted by file name (oldest first).
    ///
    /// A missing directory means nothing has been generated yet and yields
    /// an empty list.
    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(XiError::io(
                    format!("failed to read {} directory", self.dir.display()),
                    e,
                ))
            }
        };

        let suffix = format!(".{AUDIO_EXT}");
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                XiError::io(format!("failed to read {} directory", self.dir.display()), e)
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&suffix) {
                names.push(name);
            }
        }
        names.sort();

        debug!("History: {} audio files in {}", names.len(), self.dir.display());
        Ok(names
            .into_iter()
            .map(|name| HistoryEntry {
                summary: self.summary_for(&self.dir.join(&name)),
                created: created_at(&name),
                file_name: name,
            })
            .collect())
    }

    fn summary_for(&self, audio_path: &Path) -> String {
        match fs::read_to_string(transcript_path(audio_path)) {
            Ok(text) => summarize(&text, self.summary_words),
            Err(_) => NO_SUMMARY.to_string(),
        }
    }
}

/// First `max_words` words of `text` followed by `...`, or the trimmed text
/// itself when it is short enough.
pub fn summarize(text: &str, max_words: usize) -> String {
    let text = text.trim();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        text.to_string()
    }
}

fn created_at(file_name: &str) -> Option<DateTime<Local>> {
    let millis: i64 = file_name.split('-').next()?.parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|t| t.with_timezone(&Local))
}
