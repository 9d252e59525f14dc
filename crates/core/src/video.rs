use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DigestError, Result},
    format::format_clock,
};

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/v/|youtu\.be/|/embed/|/shorts/|/live/)([a-zA-Z0-9_-]{11})").unwrap()
});

/// Extract the 11-character video id from any supported YouTube URL form.
pub fn extract_video_id(url: &str) -> Result<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| DigestError::UnrecognizedUrl {
            url: url.to_string(),
        })
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Metadata for a single video, as reported by whatever fetcher fills it in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub url: String,
    pub title: String,
    pub duration_seconds: u64,
    pub channel: String,
    #[serde(default)]
    pub description: String,
    pub has_manual_subtitles: bool,
    pub has_auto_subtitles: bool,
    #[serde(default)]
    pub subtitle_languages: Vec<String>,
}

impl VideoInfo {
    pub fn has_any_subtitles(&self) -> bool {
        self.has_manual_subtitles || self.has_auto_subtitles
    }

    /// Duration rendered as a clock string, with the hour field only when the
    /// video is an hour or longer.
    pub fn duration_str(&self) -> String {
        format_clock(self.duration_seconds as f64)
    }
}
