use std::path::Path;

use async_trait::async_trait;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use log::{debug, warn};

use crate::{
    error::Result,
    types::{Frame, Segment},
};

/// Hamming distance below this means two frames are duplicates (0-64 scale).
pub const DEFAULT_DEDUP_THRESHOLD: u32 = 8;

/// Extracts a single still image at a timestamp.
///
/// Implemented outside this crate by whatever owns the video source,
/// typically an ffmpeg spawner. The implementation writes the image to
/// `output`; a missing or empty file after a successful return is treated as
/// a failed grab.
#[async_trait]
pub trait FrameGrabber: Send + Sync {
    async fn grab(&self, timestamp: f64, output: &Path) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FrameOptions {
    /// Maximum number of frames to keep.
    pub max_frames: usize,
    /// Hamming distance cutoff; lower keeps more near-duplicates.
    pub dedup_threshold: u32,
    /// Candidate pool size as a multiple of `max_frames`.
    pub candidate_multiplier: usize,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            max_frames: 12,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            candidate_multiplier: 3,
        }
    }
}

/// Uniformly sub-sample segment indices when there are more segments than
/// wanted candidates.
///
/// Deterministic stride sample: starts at index 0, strictly increasing,
/// exactly `max_candidates` long when sampling kicks in.
pub fn select_candidates(segment_count: usize, max_candidates: usize) -> Vec<usize> {
    if segment_count <= max_candidates {
        return (0..segment_count).collect();
    }
    let step = segment_count as f64 / max_candidates as f64;
    (0..max_candidates)
        .map(|i| (i as f64 * step) as usize)
        .collect()
}

/// Grab frames at the midpoints of sampled segments, keeping only those
/// perceptually distinct from every frame kept before them.
///
/// Failed grabs are skipped. A frame whose fingerprint cannot be computed is
/// kept (no basis to call it a duplicate). Discarded duplicates have their
/// image file deleted. Stops once `max_frames` frames are kept.
pub async fn extract_frames(
    grabber: &dyn FrameGrabber,
    segments: &[Segment],
    output_dir: &Path,
    options: &FrameOptions,
) -> Result<Vec<Frame>> {
    if segments.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(output_dir).await?;

    let candidates = select_candidates(
        segments.len(),
        options.max_frames * options.candidate_multiplier,
    );
    let hasher = build_hasher();

    let mut kept: Vec<Frame> = Vec::new();
    let mut kept_hashes: Vec<Option<ImageHash>> = Vec::new();

    for idx in candidates {
        if kept.len() >= options.max_frames {
            break;
        }

        let timestamp = segments[idx].midpoint();
        let path = output_dir.join(format!("frame_{:04}_{:05}.jpg", idx, timestamp as u64));

        if let Err(err) = grabber.grab(timestamp, &path).await {
            debug!("frame grab failed at {timestamp:.1}s: {err:#}");
            continue;
        }
        if !file_has_content(&path).await {
            debug!("frame grab produced no usable file at {timestamp:.1}s");
            continue;
        }

        let hash = fingerprint(&hasher, &path);
        if is_duplicate(&hash, &kept_hashes, options.dedup_threshold) {
            debug!("dropping near-duplicate frame at {timestamp:.1}s");
            if let Err(err) = tokio::fs::remove_file(&path).await {
                warn!("could not remove duplicate frame {}: {err}", path.display());
            }
            continue;
        }

        kept_hashes.push(hash);
        kept.push(Frame {
            path,
            timestamp,
            segment_index: idx,
        });
    }

    Ok(kept)
}

/// Grab frames at explicit instants instead of segment midpoints.
///
/// Each instant becomes a ±0.5s pseudo-segment so the regular pipeline,
/// dedup included, applies unchanged.
pub async fn extract_frames_at(
    grabber: &dyn FrameGrabber,
    timestamps: &[f64],
    output_dir: &Path,
    dedup_threshold: u32,
) -> Result<Vec<Frame>> {
    let segments: Vec<Segment> = timestamps
        .iter()
        .map(|&t| Segment::new((t - 0.5).max(0.0), t + 0.5, ""))
        .collect();
    let options = FrameOptions {
        max_frames: timestamps.len(),
        dedup_threshold,
        ..FrameOptions::default()
    };
    extract_frames(grabber, &segments, output_dir, &options).await
}

/// 64-bit DCT-preprocessed mean hash, the classic perceptual hash.
fn build_hasher() -> Hasher {
    HasherConfig::new()
        .hash_alg(HashAlg::Mean)
        .preproc_dct()
        .hash_size(8, 8)
        .to_hasher()
}

/// Fingerprint an image file; `None` when the file cannot be decoded.
fn fingerprint(hasher: &Hasher, path: &Path) -> Option<ImageHash> {
    match image::open(path) {
        Ok(img) => Some(hasher.hash_image(&img)),
        Err(err) => {
            warn!("could not fingerprint {}: {err}", path.display());
            None
        }
    }
}

/// A frame is a duplicate when it sits within `threshold` Hamming distance of
/// any kept fingerprint. Missing fingerprints on either side never match.
fn is_duplicate(hash: &Option<ImageHash>, kept: &[Option<ImageHash>], threshold: u32) -> bool {
    let Some(hash) = hash else {
        return false;
    };
    kept.iter()
        .flatten()
        .any(|kept_hash| hash.dist(kept_hash) < threshold)
}

async fn file_has_content(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len() > 0)
        .unwrap_or(false)
}
