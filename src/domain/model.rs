use std::fmt;
use std::path::PathBuf;

use crate::domain::AppError;
use crate::utils::is_valid_video_url;

/// A URL that passed validation. The only way to obtain one is `VideoReference::parse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    url: String,
}

impl VideoReference {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        if is_valid_video_url(input) {
            Ok(Self {
                url: input.to_string(),
            })
        } else {
            Err(AppError::InvalidUrl)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Server-defined quality/container identifier, e.g. `720p` or `128kbps`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodingLabel(String);

impl EncodingLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Encodings the service offers for one video, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatCatalog {
    pub video: Vec<EncodingLabel>,
    pub audio: Vec<EncodingLabel>,
}

impl FormatCatalog {
    /// Builds a catalog, dropping repeated labels within each track kind.
    pub fn new(video: Vec<String>, audio: Vec<String>) -> Self {
        Self {
            video: dedup_labels(video),
            audio: dedup_labels(audio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }

    pub fn contains(&self, label: &EncodingLabel) -> bool {
        self.kind_of(label).is_some()
    }

    pub fn kind_of(&self, label: &EncodingLabel) -> Option<TrackKind> {
        if self.video.contains(label) {
            Some(TrackKind::Video)
        } else if self.audio.contains(label) {
            Some(TrackKind::Audio)
        } else {
            None
        }
    }
}

fn dedup_labels(labels: Vec<String>) -> Vec<EncodingLabel> {
    let mut unique: Vec<EncodingLabel> = Vec::with_capacity(labels.len());
    for label in labels.into_iter().map(EncodingLabel::new) {
        if !unique.contains(&label) {
            unique.push(label);
        }
    }
    unique
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub title: String,
    pub author: String,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
}

/// Result of a successful discovery call. Formats and info always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub reference: VideoReference,
    pub formats: FormatCatalog,
    pub info: MediaInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub name: String,
    pub byte_length: u64,
    pub path: PathBuf,
}
