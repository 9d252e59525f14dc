use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Transcript contains no segments")]
    EmptyTranscript,

    #[error("Could not read subtitles from {path}: {source}")]
    SubtitleRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Analysis response is not valid JSON after repair: {reason}")]
    MalformedResponse { raw: String, reason: String },

    #[error("Analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Unrecognized YouTube URL: {url}")]
    UnrecognizedUrl { url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
