use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::types::{Chapter, Frame, VideoDigest};

/// Prefix length of the normalized key used to deduplicate flat list fields.
const DEDUP_KEY_PREFIX: usize = 64;

/// Cap applied to deduplicated flat list fields.
const LIST_FIELD_CAP: usize = 12;

/// Merge per-chunk analysis results into one mapping.
///
/// A single result is returned untouched. Otherwise: overviews are joined
/// with a space in chunk order, chapter lists are concatenated (chunks are
/// chronological, so the result stays chronological), flat string lists are
/// deduplicated by normalized key and capped, and any other field keeps its
/// first occurrence.
pub fn merge_chunk_results(mut results: Vec<Map<String, Value>>) -> Map<String, Value> {
    if results.len() == 1 {
        return results.pop().unwrap_or_default();
    }

    let mut merged = Map::new();
    let mut overviews: Vec<String> = Vec::new();

    for result in results {
        for (key, value) in result {
            match key.as_str() {
                "overview" => {
                    if let Value::String(text) = value {
                        if !text.trim().is_empty() {
                            overviews.push(text);
                        }
                    }
                }
                _ => match value {
                    Value::Array(items) => {
                        let slot = merged.entry(key).or_insert_with(|| Value::Array(Vec::new()));
                        if let Value::Array(all) = slot {
                            all.extend(items);
                        }
                    }
                    other => {
                        merged.entry(key).or_insert(other);
                    }
                },
            }
        }
    }

    for (key, value) in merged.iter_mut() {
        if key == "chapters" {
            continue;
        }
        if let Value::Array(items) = value {
            if items.iter().all(Value::is_string) {
                *items = dedup_strings(std::mem::take(items));
            }
        }
    }

    merged.insert("overview".to_string(), Value::String(overviews.join(" ")));
    merged
        .entry("chapters")
        .or_insert_with(|| Value::Array(Vec::new()));
    merged
}

fn dedup_strings(items: Vec<Value>) -> Vec<Value> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let Value::String(text) = item else { continue };
        let key: String = text
            .trim()
            .to_lowercase()
            .chars()
            .take(DEDUP_KEY_PREFIX)
            .collect();
        if seen.insert(key) {
            out.push(Value::String(text));
            if out.len() >= LIST_FIELD_CAP {
                break;
            }
        }
    }
    out
}

/// Shape a reconciled mapping into the digest, tolerating absent or mistyped
/// fields: the mapping originates from a generative model, so every lookup
/// falls back to an empty value instead of erroring.
pub fn build_digest(
    title: impl Into<String>,
    analysis: &Map<String, Value>,
    frames: Vec<Frame>,
) -> VideoDigest {
    let overview = analysis
        .get("overview")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let key_points = analysis
        .get("key_points")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let chapters = analysis
        .get("chapters")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(chapter_from)
                .collect()
        })
        .unwrap_or_default();

    VideoDigest {
        title: title.into(),
        overview,
        key_points,
        chapters,
        frames,
    }
}

fn chapter_from(entry: &Map<String, Value>) -> Chapter {
    Chapter {
        title: text_field(entry, "title"),
        timestamp: text_field(entry, "timestamp"),
        start_seconds: entry
            .get("start_seconds")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        summary: text_field(entry, "summary"),
    }
}

fn text_field(entry: &Map<String, Value>, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn single_result_is_identity() {
        let result = as_map(json!({"overview": "solo", "chapters": [{"title": "a"}]}));
        let merged = merge_chunk_results(vec![result.clone()]);
        assert_eq!(merged, result);
    }

    #[test]
    fn overviews_join_and_chapters_concatenate() {
        let first = as_map(json!({
            "overview": "part one.",
            "chapters": [{"title": "intro"}, {"title": "middle"}]
        }));
        let second = as_map(json!({
            "overview": "part two.",
            "chapters": [{"title": "end"}]
        }));
        let merged = merge_chunk_results(vec![first, second]);
        assert_eq!(merged["overview"], json!("part one. part two."));
        let chapters = merged["chapters"].as_array().unwrap();
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[2]["title"], json!("end"));
    }

    #[test]
    fn key_points_dedupe_case_insensitively() {
        let first = as_map(json!({"overview": "a", "key_points": ["Use the CLI", "ship fast"]}));
        let second = as_map(json!({"overview": "b", "key_points": ["  use the cli  ", "measure twice"]}));
        let merged = merge_chunk_results(vec![first, second]);
        assert_eq!(
            merged["key_points"],
            json!(["Use the CLI", "ship fast", "measure twice"])
        );
    }

    #[test]
    fn deduped_lists_are_capped() {
        let points: Vec<String> = (0..30).map(|i| format!("point number {i}")).collect();
        let first = as_map(json!({"overview": "a", "key_points": points}));
        let second = as_map(json!({"overview": "b"}));
        let merged = merge_chunk_results(vec![first, second]);
        assert_eq!(merged["key_points"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn absent_fields_default_instead_of_failing() {
        let merged = merge_chunk_results(vec![as_map(json!({})), as_map(json!({}))]);
        assert_eq!(merged["overview"], json!(""));
        assert_eq!(merged["chapters"], json!([]));
    }

    #[test]
    fn scalar_fields_keep_first_occurrence() {
        let first = as_map(json!({"overview": "a", "language": "en"}));
        let second = as_map(json!({"overview": "b", "language": "de"}));
        let merged = merge_chunk_results(vec![first, second]);
        assert_eq!(merged["language"], json!("en"));
    }

    #[test]
    fn digest_reads_fields_leniently() {
        let analysis = as_map(json!({
            "overview": "the thesis",
            "key_points": ["one", 2, "three"],
            "chapters": [
                {"title": "intro", "timestamp": "[00:00]", "start_seconds": 0, "summary": "s"},
                {"title": "later", "start_seconds": 65.5},
                "not a chapter"
            ]
        }));
        let digest = build_digest("My Video", &analysis, Vec::new());
        assert_eq!(digest.title, "My Video");
        assert_eq!(digest.overview, "the thesis");
        assert_eq!(digest.key_points, vec!["one", "three"]);
        assert_eq!(digest.chapters.len(), 2);
        assert_eq!(digest.chapters[0].timestamp, "[00:00]");
        assert_eq!(digest.chapters[1].start_seconds, 65.5);
        assert!(digest.chapters[1].summary.is_empty());
    }

    #[test]
    fn digest_from_empty_mapping() {
        let digest = build_digest("Empty", &Map::new(), Vec::new());
        assert!(digest.overview.is_empty());
        assert!(digest.key_points.is_empty());
        assert!(digest.chapters.is_empty());
    }
}
