use crate::types::Segment;

/// Format seconds as MM:SS, or HH:MM:SS once the hour mark is reached.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Render segments as the `[MM:SS] text` transcript the analysis collaborator
/// receives, one line per segment.
pub fn format_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| format!("{} {}", seg.timestamp_str(), seg.text))
        .collect::<Vec<_>>()
        .join("\n")
}
