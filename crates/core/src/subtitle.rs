use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{DigestError, Result},
    types::Segment,
};

/// Timing line in SRT (comma) or WebVTT (dot) millisecond form.
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})")
        .unwrap()
});

/// Inline HTML/VTT markup, e.g. `<c>`, `<font color="white">`, `<00:00:01.234>`.
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Blank-line block boundary.
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Parse block-structured caption text (SRT, or SRT-like WebVTT) into
/// segments in file order.
///
/// Malformed blocks are skipped, never fatal: a block contributes a segment
/// only if it has a recognizable timing line and non-empty text after tag
/// stripping.
pub fn parse_subtitles(raw: &str) -> Vec<Segment> {
    let text = raw
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    for block in BLOCK_RE.split(text) {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() < 2 {
            continue;
        }

        // The timing line may be preceded by a numeric index or other preamble.
        let timing = lines
            .iter()
            .enumerate()
            .find_map(|(i, line)| TIME_RE.captures(line).map(|caps| (i, caps)));
        let Some((timing_idx, caps)) = timing else {
            debug!("skipping caption block without timing line: {:?}", lines[0]);
            continue;
        };

        let text_lines = &lines[timing_idx + 1..];
        if text_lines.is_empty() {
            continue;
        }

        let start = timestamp_seconds(&caps, 1);
        let end = timestamp_seconds(&caps, 5);
        let text = strip_tags(&text_lines.join(" "));
        if text.is_empty() {
            debug!("skipping caption block with empty text at {start}s");
            continue;
        }

        segments.push(Segment { start, end, text });
    }
    segments
}

/// Read and parse a caption file, decoding leniently (invalid byte sequences
/// are replaced rather than failing).
pub async fn parse_subtitle_file(path: &Path) -> Result<Vec<Segment>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DigestError::SubtitleRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_subtitles(&String::from_utf8_lossy(&bytes)))
}

fn timestamp_seconds(caps: &regex::Captures<'_>, first_group: usize) -> f64 {
    let field = |i: usize| caps[first_group + i].parse::<u64>().unwrap_or(0) as f64;
    field(0) * 3600.0 + field(1) * 60.0 + field(2) + field(3) / 1000.0
}

fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_indexed_blocks_and_strips_tags() {
        let raw = "1\n00:00:00,000 --> 00:00:03,500\nHello\n\n2\n00:00:03,500-->00:00:07,000\n<font>World</font>";
        let segments = parse_subtitles(raw);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello");
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 3.5);
        assert_eq!(segments[1].text, "World");
        assert_eq!(segments[1].start, 3.5);
        assert_eq!(segments[1].end, 7.0);
    }

    #[test]
    fn accepts_vtt_dot_separators_and_cue_tags() {
        let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:04.250 align:start\nHello <00:00:02.100><c>wor</c>ld";
        let segments = parse_subtitles(raw);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 1.0);
        assert_eq!(segments[0].end, 4.25);
        assert_eq!(segments[0].text, "Hello world");
    }

    #[test]
    fn joins_multiline_text_with_spaces() {
        let raw = "5\n00:01:00,000 --> 00:01:05,000\nfirst line\nsecond line";
        let segments = parse_subtitles(raw);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "first line second line");
    }

    #[test]
    fn skips_blocks_without_timing_or_text() {
        let raw = "not a cue\njust text\n\n3\n00:00:08,000 --> 00:00:09,000\n\n\n4\n00:00:10,000 --> 00:00:11,000\n<i></i>\n\n5\n00:00:12,000 --> 00:00:13,000\nkept";
        let segments = parse_subtitles(raw);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "kept");
    }

    #[test]
    fn tolerates_bom_and_crlf() {
        let raw = "\u{feff}1\r\n00:00:00,000 --> 00:00:02,000\r\nHi there\r\n\r\n2\r\n00:00:02,000 --> 00:00:04,000\r\nBye";
        let segments = parse_subtitles(raw);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hi there");
        assert_eq!(segments[1].text, "Bye");
    }

    #[test]
    fn converts_hours_minutes_millis() {
        let raw = "1\n01:02:03,456 --> 01:02:04,000\nlate cue";
        let segments = parse_subtitles(raw);
        assert_eq!(segments[0].start, 3723.456);
        assert_eq!(segments[0].end, 3724.0);
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(parse_subtitles("").is_empty());
        assert!(parse_subtitles("   \n\n  ").is_empty());
        assert!(parse_subtitles("WEBVTT").is_empty());
    }

    #[test]
    fn tag_stripping_is_idempotent() {
        let once = strip_tags("a <b>bold</b> claim");
        let twice = strip_tags(&once);
        assert_eq!(once, "a bold claim");
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn reads_caption_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.srt");
        tokio::fs::write(&path, "1\n00:00:00,000 --> 00:00:01,000\nfrom disk")
            .await
            .unwrap();

        let segments = parse_subtitle_file(&path).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "from disk");
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = parse_subtitle_file(Path::new("/nonexistent/captions.srt"))
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::SubtitleRead { .. }));
        assert!(err.to_string().contains("/nonexistent/captions.srt"));
    }
}
