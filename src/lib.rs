pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod summarize;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::PipelineError;

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v=([^&]+)|youtu\.be/([^?]+)").expect("video id pattern is valid"));

/// Identifier of a single video, as found in its URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Thumbnail image for the video. No request is made to check it exists.
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/0.jpg", self.0)
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single captioned fragment
#[derive(Debug, Clone, Serialize)]
pub struct CaptionFragment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl CaptionFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: 0.0,
            duration: 0.0,
        }
    }
}

/// Complete caption track for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub title: String,
    pub language: String,
    pub fragments: Vec<CaptionFragment>,
}

impl Transcript {
    /// Flatten the fragments into one blob, each fragment prefixed by a single space.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.fragments.iter().map(|f| f.text.len() + 1).sum());
        for fragment in &self.fragments {
            out.push(' ');
            out.push_str(&fragment.text);
        }
        out
    }
}

/// Extract the video ID from a `?v=ID` or `youtu.be/ID` URL
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let caps = VIDEO_ID_RE.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| VideoId(m.as_str().to_string()))
}
