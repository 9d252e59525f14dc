//! Konspekt Core Library
//!
//! Turns a video transcript into a digest: parses subtitle text into timed
//! segments, coalesces them into merge windows, splits the result into
//! model-sized chunks, samples perceptually distinct key frames, repairs the
//! almost-JSON the model answers with, and reconciles per-chunk answers into
//! one digest.

pub mod cache;
pub mod chunk;
pub mod error;
pub mod format;
pub mod frames;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod reconcile;
pub mod repair;
pub mod subtitle;
pub mod types;
pub mod video;

// Re-export commonly used items at crate root
pub use cache::{get_cache_dir, get_frames_dir, get_root_cache_dir, get_transcript_path};
pub use chunk::{build_requests, chunk_segments, SEGMENT_OVERHEAD};
pub use error::{DigestError, Result};
pub use format::{format_clock, format_segments};
pub use frames::{
    extract_frames, extract_frames_at, select_candidates, FrameGrabber, FrameOptions,
    DEFAULT_DEDUP_THRESHOLD,
};
pub use merge::merge_segments;
pub use pipeline::{
    load_digest, load_transcript, save_digest, save_transcript, ChunkAnalyzer, DigestConfig,
    DigestPipeline, TranscriptSource,
};
pub use progress::{LogProgress, NullProgress, ProgressSink, Stage, StageEvent, StageStatus};
pub use reconcile::{build_digest, merge_chunk_results};
pub use repair::repair_json;
pub use subtitle::{parse_subtitle_file, parse_subtitles};
pub use types::{AnalysisRequest, Chapter, Frame, Segment, Transcript, VideoDigest};
pub use video::{extract_video_id, watch_url, VideoInfo};
