use crate::types::{AnalysisRequest, Frame, Segment};

/// Per-segment cost on top of the text itself, covering the rendered
/// `[HH:MM:SS] ` prefix and line break.
pub const SEGMENT_OVERHEAD: usize = 12;

/// Partition segments into runs whose accumulated cost stays within
/// `max_chars`.
///
/// Forward-only: a chunk closes as soon as the next segment would push it
/// over the budget. A single segment that is itself over budget still lands
/// in a chunk of its own; nothing is dropped or split, so concatenating the
/// output reproduces the input.
pub fn chunk_segments(segments: &[Segment], max_chars: usize) -> Vec<Vec<Segment>> {
    let mut chunks = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_chars = 0usize;

    for seg in segments {
        let seg_chars = seg.text.len() + SEGMENT_OVERHEAD;
        if current_chars + seg_chars > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push(seg.clone());
        current_chars += seg_chars;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Pair each transcript chunk with the frames inside its time span, capped at
/// `max_images` per request.
pub fn build_requests(
    segments: &[Segment],
    frames: &[Frame],
    max_chars: usize,
    max_images: usize,
) -> Vec<AnalysisRequest> {
    chunk_segments(segments, max_chars)
        .into_iter()
        .map(|chunk| {
            let mut chunk_frames = frames_for_chunk(frames, &chunk);
            chunk_frames.truncate(max_images);
            AnalysisRequest {
                segments: chunk,
                frames: chunk_frames,
                char_budget: max_chars,
            }
        })
        .collect()
}

/// Frames whose timestamp falls within `[first.start, last.end]` of the
/// chunk, in chronological order.
fn frames_for_chunk(frames: &[Frame], segments: &[Segment]) -> Vec<Frame> {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return Vec::new();
    };
    frames
        .iter()
        .filter(|frame| first.start <= frame.timestamp && frame.timestamp <= last.end)
        .cloned()
        .collect()
}
