use crate::types::Segment;

/// Merge consecutive segments into chunks spanning at most `window_seconds`.
///
/// Greedy single pass: a segment is absorbed into the open chunk while its
/// end stays within the window measured from the chunk's start; the first
/// segment that falls outside closes the chunk and opens the next one.
/// Decisions are never revisited.
pub fn merge_segments(segments: &[Segment], window_seconds: f64) -> Vec<Segment> {
    let Some(first) = segments.first() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    let mut chunk_start = first.start;
    let mut chunk_end = first.end;
    let mut chunk_texts = vec![first.text.as_str()];

    for seg in &segments[1..] {
        if seg.end - chunk_start <= window_seconds {
            chunk_end = seg.end;
            chunk_texts.push(seg.text.as_str());
        } else {
            merged.push(Segment {
                start: chunk_start,
                end: chunk_end,
                text: chunk_texts.join(" "),
            });
            chunk_start = seg.start;
            chunk_end = seg.end;
            chunk_texts = vec![seg.text.as_str()];
        }
    }
    merged.push(Segment {
        start: chunk_start,
        end: chunk_end,
        text: chunk_texts.join(" "),
    });

    merged
}
