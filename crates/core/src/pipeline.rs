use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::fs;

use crate::{
    chunk::build_requests,
    error::{DigestError, Result},
    frames::{extract_frames, FrameGrabber, FrameOptions},
    merge::merge_segments,
    progress::{NullProgress, ProgressSink, Stage, StageEvent, StageStatus},
    reconcile::{build_digest, merge_chunk_results},
    repair::repair_json,
    subtitle::{parse_subtitle_file, parse_subtitles},
    types::{AnalysisRequest, Frame, Segment, Transcript, VideoDigest},
};

/// Produces the model's textual answer for one transcript chunk.
///
/// Implemented outside this crate by whatever owns the model client. The
/// returned text goes through [`repair_json`] before use, so implementations
/// hand back the raw response as-is.
#[async_trait]
pub trait ChunkAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Merge window in seconds; segments starting within it are coalesced.
    pub merge_window_seconds: f64,
    /// Character budget per analysis chunk.
    pub max_chunk_chars: usize,
    /// Frames attached to a single analysis request, at most.
    pub max_images_per_request: usize,
    pub frame_options: FrameOptions,
    /// Where extracted frames land. `None` disables frame extraction.
    pub frames_dir: Option<PathBuf>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            merge_window_seconds: 60.0,
            max_chunk_chars: 60_000,
            max_images_per_request: 4,
            frame_options: FrameOptions::default(),
            frames_dir: None,
        }
    }
}

/// Where the transcript comes from.
#[derive(Debug, Clone)]
pub enum TranscriptSource {
    /// Raw SRT or VTT text.
    Captions(String),
    /// Path to an SRT or VTT file on disk.
    CaptionFile(PathBuf),
    /// Segments that were already parsed, e.g. from a speech-to-text pass.
    Transcript(Transcript),
}

/// Runs transcript loading, merging, frame extraction and chunked analysis
/// end to end, reporting each stage to the configured sink.
pub struct DigestPipeline {
    config: DigestConfig,
    analyzer: Arc<dyn ChunkAnalyzer>,
    grabber: Option<Arc<dyn FrameGrabber>>,
    progress: Arc<dyn ProgressSink>,
}

impl DigestPipeline {
    pub fn new(config: DigestConfig, analyzer: Arc<dyn ChunkAnalyzer>) -> Self {
        Self {
            config,
            analyzer,
            grabber: None,
            progress: Arc::new(NullProgress),
        }
    }

    pub fn with_frame_grabber(mut self, grabber: Arc<dyn FrameGrabber>) -> Self {
        self.grabber = Some(grabber);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, source: TranscriptSource, title: &str) -> Result<VideoDigest> {
        self.emit(Stage::Transcript, StageStatus::Started, "Loading transcript");
        let segments = match self.load_segments(source).await {
            Ok(segments) => segments,
            Err(err) => {
                self.emit(Stage::Transcript, StageStatus::Failed, err.to_string());
                return Err(err);
            }
        };
        if segments.is_empty() {
            self.emit(Stage::Transcript, StageStatus::Failed, "No usable segments");
            return Err(DigestError::EmptyTranscript);
        }
        self.emit(
            Stage::Transcript,
            StageStatus::Finished,
            format!("Parsed {} segments", segments.len()),
        );

        self.emit(
            Stage::Merge,
            StageStatus::Started,
            format!(
                "Coalescing over a {:.0}s window",
                self.config.merge_window_seconds
            ),
        );
        let merged = merge_segments(&segments, self.config.merge_window_seconds);
        self.emit(
            Stage::Merge,
            StageStatus::Finished,
            format!("{} segments after merging", merged.len()),
        );

        let frames = self.collect_frames(&merged).await?;

        let requests = build_requests(
            &merged,
            &frames,
            self.config.max_chunk_chars,
            self.config.max_images_per_request,
        );
        self.emit(
            Stage::Analysis,
            StageStatus::Started,
            format!("Analyzing {} chunk(s)", requests.len()),
        );
        let mut results = Vec::with_capacity(requests.len());
        for request in &requests {
            let response = match self.analyzer.analyze(request).await {
                Ok(response) => response,
                Err(err) => {
                    let reason = format!("{err:#}");
                    self.emit(Stage::Analysis, StageStatus::Failed, reason.clone());
                    return Err(DigestError::AnalysisFailed { reason });
                }
            };
            match repair_json(&response) {
                Ok(result) => results.push(result),
                Err(err) => {
                    self.emit(Stage::Analysis, StageStatus::Failed, err.to_string());
                    return Err(err);
                }
            }
        }

        let analysis = merge_chunk_results(results);
        let digest = build_digest(title, &analysis, frames);
        self.emit(
            Stage::Analysis,
            StageStatus::Finished,
            format!(
                "{} chapters, {} key points",
                digest.chapters.len(),
                digest.key_points.len()
            ),
        );
        Ok(digest)
    }

    async fn load_segments(&self, source: TranscriptSource) -> Result<Vec<Segment>> {
        match source {
            TranscriptSource::Captions(raw) => Ok(parse_subtitles(&raw)),
            TranscriptSource::CaptionFile(path) => parse_subtitle_file(&path).await,
            TranscriptSource::Transcript(transcript) => Ok(transcript
                .segments
                .into_iter()
                .filter(|segment| !segment.text.trim().is_empty())
                .collect()),
        }
    }

    /// Frame extraction is best-effort: a missing grabber or target directory
    /// skips it, and an extraction error degrades to a text-only digest.
    async fn collect_frames(&self, segments: &[Segment]) -> Result<Vec<Frame>> {
        let (Some(grabber), Some(frames_dir)) =
            (self.grabber.as_deref(), self.config.frames_dir.as_deref())
        else {
            self.emit(Stage::Frames, StageStatus::Skipped, "Frame extraction disabled");
            return Ok(Vec::new());
        };

        self.emit(
            Stage::Frames,
            StageStatus::Started,
            format!(
                "Sampling up to {} key frames",
                self.config.frame_options.max_frames
            ),
        );
        match extract_frames(grabber, segments, frames_dir, &self.config.frame_options).await {
            Ok(frames) => {
                self.emit(
                    Stage::Frames,
                    StageStatus::Finished,
                    format!("Kept {} distinct frames", frames.len()),
                );
                Ok(frames)
            }
            Err(err) => {
                self.emit(
                    Stage::Frames,
                    StageStatus::Failed,
                    format!("Continuing without frames: {err}"),
                );
                Ok(Vec::new())
            }
        }
    }

    fn emit(&self, stage: Stage, status: StageStatus, message: impl Into<String>) {
        self.progress.emit(StageEvent::new(stage, status, message));
    }
}

/// Load a transcript from a cached file
pub async fn load_transcript(path: &Path) -> Result<Transcript> {
    let json_content = fs::read_to_string(path).await?;
    let transcript: Transcript = serde_json::from_str(&json_content)?;
    Ok(transcript)
}

/// Save a transcript to a file
pub async fn save_transcript(transcript: &Transcript, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(transcript)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

/// Load a digest from a cached file
pub async fn load_digest(path: &Path) -> Result<VideoDigest> {
    let json_content = fs::read_to_string(path).await?;
    let digest: VideoDigest = serde_json::from_str(&json_content)?;
    Ok(digest)
}

/// Save a digest to a file
pub async fn save_digest(digest: &VideoDigest, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(digest)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
