use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::format::format_clock;

/// One time-stamped unit of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Middle timestamp, used to pick a representative frame.
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Start time as `[MM:SS]`, or `[HH:MM:SS]` past the one hour mark.
    pub fn timestamp_str(&self) -> String {
        format!("[{}]", format_clock(self.start))
    }
}

/// Transcript document as produced by the ASR collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
}

impl Transcript {
    /// Build a transcript from bare segments, deriving the joined text.
    pub fn from_segments(segments: Vec<Segment>, language: impl Into<String>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            segments,
            language: language.into(),
        }
    }
}

/// A kept key frame: the extracted image file plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub path: PathBuf,
    /// Seconds; the midpoint of the segment the frame was sampled from.
    pub timestamp: f64,
    /// Index into the segment list the frame was sampled from.
    pub segment_index: usize,
}

impl Frame {
    pub fn timestamp_str(&self) -> String {
        format!("[{}]", format_clock(self.timestamp))
    }
}

/// One chapter of the final digest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub title: String,
    /// Bracketed clock string as it appeared in the transcript, e.g. `[03:42]`.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub start_seconds: f64,
    #[serde(default)]
    pub summary: String,
}

/// The digest handed back to the caller: reconciled analysis output plus the
/// kept frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDigest {
    pub title: String,
    pub overview: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

/// One unit of work for the content-analysis collaborator: a transcript chunk
/// that fits the character budget, plus the frames inside its time span.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub segments: Vec<Segment>,
    pub frames: Vec<Frame>,
    pub char_budget: usize,
}

impl AnalysisRequest {
    /// The chunk's transcript in the `[MM:SS] text` layout.
    pub fn transcript_text(&self) -> String {
        crate::format::format_segments(&self.segments)
    }
}
