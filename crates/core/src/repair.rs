use log::debug;
use serde_json::{Map, Value};

use crate::error::{DigestError, Result};

/// Parse the analysis collaborator's reply into a JSON object, repairing the
/// failure modes generative models actually produce: markdown fences around
/// the payload, and literal newlines, tabs or quotes inside string values.
///
/// Repair is a single pass; text that still fails to parse afterwards is
/// reported as malformed with the original reply attached.
pub fn repair_json(raw: &str) -> Result<Map<String, Value>> {
    let stripped = strip_fences(raw);
    if stripped.len() != raw.trim().len() {
        debug!("stripped markdown fences from analysis response");
    }
    let escaped = escape_string_contents(stripped);
    if escaped != stripped {
        debug!("escaped literal characters inside analysis response strings");
    }
    let value: Value =
        serde_json::from_str(&escaped).map_err(|err| DigestError::MalformedResponse {
            raw: raw.to_string(),
            reason: err.to_string(),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DigestError::MalformedResponse {
            raw: raw.to_string(),
            reason: "top-level JSON value is not an object".to_string(),
        }),
    }
}

/// Drop a leading ``` line and anything from a trailing ``` onward.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(pos) => &text[pos + 1..],
            None => "",
        };
    }
    if text.ends_with("```") {
        if let Some(pos) = text.rfind("```") {
            text = &text[..pos];
        }
    }
    text
}

/// Rewrite literal control characters and embedded quotes inside JSON string
/// values to their escaped forms. Already-escaped sequences pass through
/// untouched.
fn escape_string_contents(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            i += 1;
            continue;
        }

        match ch {
            '\\' if i + 1 < chars.len() => {
                out.push(ch);
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '"' => {
                if closes_string(&chars, i + 1) {
                    in_string = false;
                    out.push('"');
                } else {
                    out.push_str("\\\"");
                }
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
        i += 1;
    }

    out
}

/// A quote closes its string only when the next non-whitespace character is a
/// JSON structural character or the input ends; anything else means the model
/// embedded a literal quote mid-value. A legitimate closer followed directly
/// by prose on the same line is misread as embedded, a known limit of the
/// heuristic.
fn closes_string(chars: &[char], mut i: usize) -> bool {
    while i < chars.len() && matches!(chars[i], ' ' | '\t' | '\r' | '\n') {
        i += 1;
    }
    i >= chars.len() || matches!(chars[i], ',' | '}' | ']' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_passes_through() {
        let map = repair_json(r#"{"overview": "clean", "chapters": []}"#).unwrap();
        assert_eq!(map["overview"], json!("clean"));
        assert_eq!(map["chapters"], json!([]));
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let map = repair_json(r#"{"overview": "He said "hi" to me"}"#).unwrap();
        assert_eq!(map["overview"], json!("He said \"hi\" to me"));
    }

    #[test]
    fn literal_newlines_and_tabs_are_escaped() {
        let map = repair_json("{\"overview\": \"line one\nline\ttwo\"}").unwrap();
        assert_eq!(map["overview"], json!("line one\nline\ttwo"));
    }

    #[test]
    fn already_escaped_sequences_survive() {
        let original = r#"{"a": "one\ntwo \"quoted\""}"#;
        let map = repair_json(original).unwrap();
        assert_eq!(map["a"], json!("one\ntwo \"quoted\""));
    }

    #[test]
    fn unescaping_then_repairing_round_trips() {
        let original = r#"{"a": "line1\nline2 \"q\""}"#;
        let parsed: Value = serde_json::from_str(original).unwrap();
        // turn the escapes back into literal characters, as a model would
        let broken = r#"{"a": "line1
line2 "q""}"#;
        let repaired = repair_json(broken).unwrap();
        assert_eq!(Value::Object(repaired), parsed);
    }

    #[test]
    fn markdown_fences_are_stripped() {
        let fenced = "```json\n{\"overview\": \"fenced\"}\n```";
        let map = repair_json(fenced).unwrap();
        assert_eq!(map["overview"], json!("fenced"));

        let bare = "```\n{\"overview\": \"bare\"}\n```";
        assert_eq!(repair_json(bare).unwrap()["overview"], json!("bare"));
    }

    #[test]
    fn leading_fence_without_trailing_is_fine() {
        let map = repair_json("```json\n{\"k\": 1}").unwrap();
        assert_eq!(map["k"], json!(1));
    }

    #[test]
    fn garbage_reports_malformed_with_raw_attached() {
        let err = repair_json("definitely not json").unwrap_err();
        match err {
            DigestError::MalformedResponse { raw, .. } => {
                assert_eq!(raw, "definitely not json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn top_level_array_is_malformed() {
        let err = repair_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DigestError::MalformedResponse { .. }));
    }

    #[test]
    fn quote_before_colon_still_closes_key_strings() {
        // keys end at a quote followed by a colon; values with embedded
        // quotes still parse
        let map = repair_json(r#"{"title": "The "Best" Part", "n": 2}"#).unwrap();
        assert_eq!(map["title"], json!("The \"Best\" Part"));
        assert_eq!(map["n"], json!(2));
    }

    #[test]
    fn multiline_values_inside_nested_structures() {
        let broken = "{\"chapters\": [{\"summary\": \"first\nsecond\"}], \"overview\": \"ok\"}";
        let map = repair_json(broken).unwrap();
        assert_eq!(map["chapters"][0]["summary"], json!("first\nsecond"));
    }
}
