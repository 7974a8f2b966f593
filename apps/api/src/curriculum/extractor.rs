//! Text-to-structure extraction — recovers a JSON value from free-form model output.
//!
//! Model output routinely wraps the JSON we asked for in prose, markdown fences,
//! or both. `extract` never fails: it returns the best structure it can find, or
//! `None` with a warning when the text holds nothing parseable.
//!
//! Order of attempts:
//! 1. Inner content of the first fenced block (```json … ``` or ``` … ```)
//! 2. Balanced `{…}` / `[…]` spans scanned left to right, string-aware
//! 3. If a fenced candidate does not parse, step 2 runs over the candidate itself

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("valid fence regex")
    })
}

/// Extracts the first parseable JSON object or array from `text`.
pub fn extract(text: &str) -> Option<Value> {
    if let Some(candidate) = fenced_block(text) {
        if let Some(value) = parse_structured(candidate) {
            return Some(value);
        }
        debug!("Fenced block did not parse, scanning its content for a balanced span");
        if let Some(value) = scan_for_structure(candidate) {
            return Some(value);
        }
    }

    if let Some(value) = scan_for_structure(text) {
        return Some(value);
    }

    warn!(
        "No parseable structure found in model output ({} chars): {:?}",
        text.len(),
        text.chars().take(120).collect::<String>()
    );
    None
}

/// Returns the inner content of the first fenced code block, if any.
fn fenced_block(text: &str) -> Option<&str> {
    fence_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|inner| !inner.is_empty())
}

/// Parses `candidate` only if it is an object or array.
fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Tries every opening delimiter in turn and returns the first balanced span
/// that parses. One walk resolves every opener it passes outside a string, so
/// openers already seen are not walked again.
fn scan_for_structure(text: &str) -> Option<Value> {
    let mut spans: HashMap<usize, Option<usize>> = HashMap::new();
    let mut from = 0;
    while let Some(offset) = text[from..].find(|c: char| c == '{' || c == '[') {
        let start = from + offset;
        if !spans.contains_key(&start) {
            record_spans(text, start, &mut spans);
        }
        if let Some(Some(end)) = spans.get(&start) {
            if let Some(value) = parse_structured(&text[start..*end]) {
                return Some(value);
            }
        }
        from = start + 1;
    }
    None
}

/// Returns the byte index just past the delimiter that closes the opener at
/// `start`. A mismatched closer or running off the end yields `None`.
pub(crate) fn balanced_span(text: &str, start: usize) -> Option<usize> {
    let mut spans = HashMap::new();
    record_spans(text, start, &mut spans);
    spans.get(&start).copied().flatten()
}

/// Walks forward from the opener at `start` until its stack empties. Every
/// opener passed outside a string gets its closing index, or `None` when the
/// walk hits a mismatched closer or the end of the text while it is still open.
/// Delimiters inside strings are ignored.
fn record_spans(text: &str, start: usize, spans: &mut HashMap<usize, Option<usize>>) {
    let mut stack: Vec<(usize, char)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        let pos = start + i;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push((pos, '}')),
            '[' => stack.push((pos, ']')),
            '}' | ']' => match stack.pop() {
                Some((opener, closer)) if closer == c => {
                    spans.insert(opener, Some(pos + c.len_utf8()));
                    if stack.is_empty() {
                        return;
                    }
                }
                popped => {
                    if let Some((opener, _)) = popped {
                        spans.insert(opener, None);
                    }
                    break;
                }
            },
            _ => {}
        }
    }

    for (opener, _) in stack {
        spans.insert(opener, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_clean_array() {
        let value = extract(r#"[{"skill": "React"}]"#).unwrap();
        assert_eq!(value, json!([{"skill": "React"}]));
    }

    #[test]
    fn test_extracts_json_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        assert_eq!(extract(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extracts_bare_fence() {
        let text = "```\n[1, 2, 3]\n```";
        assert_eq!(extract(text).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_fence_with_leading_prose_inside() {
        let text = "```json\nSure! The modules are below.\n[{\"module_name\": \"JS\"}]\n```";
        assert_eq!(extract(text).unwrap(), json!([{"module_name": "JS"}]));
    }

    #[test]
    fn test_span_embedded_in_prose() {
        let text = "After careful review, the roadmap is {\"roadmap\": [{\"title\": \"A\"}]} and that is final.";
        assert_eq!(extract(text).unwrap(), json!({"roadmap": [{"title": "A"}]}));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"Result: {"note": "use } and ] freely", "n": 2} trailing"#;
        assert_eq!(
            extract(text).unwrap(),
            json!({"note": "use } and ] freely", "n": 2})
        );
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let text = r#"x {"quote": "she said \"hi {\" ok"} y"#;
        assert_eq!(extract(text).unwrap(), json!({"quote": "she said \"hi {\" ok"}));
    }

    #[test]
    fn test_skips_bracketed_aside_before_real_structure() {
        let text = "Modules [see below]:\n[{\"module_name\": \"CSS\"}]";
        assert_eq!(extract(text).unwrap(), json!([{"module_name": "CSS"}]));
    }

    #[test]
    fn test_mismatched_opener_does_not_hide_later_span() {
        let text = "note {oops] then [{\"x\": 1}]";
        assert_eq!(extract(text).unwrap(), json!([{"x": 1}]));
    }

    #[test]
    fn test_unclosed_brace_in_prose_does_not_hide_later_object() {
        let text = r#"Wrap names in {braces as usual. Result: {"skill": "Rust"}"#;
        assert_eq!(extract(text), Some(json!({"skill": "Rust"})));
    }

    #[test]
    fn test_many_unclosed_openers_before_structure() {
        let text = format!("{} [\"React\", \"Jest\"]", "{".repeat(20_000));
        assert_eq!(extract(&text), Some(json!(["React", "Jest"])));
    }

    #[test]
    fn test_opener_inside_string_of_unclosed_span_is_still_tried() {
        let text = r#"{ "note: [1, 2]"#;
        assert_eq!(extract(text), Some(json!([1, 2])));
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert!(extract("here is {\"a\": [1, 2").is_none());
    }

    #[test]
    fn test_no_structure_returns_none() {
        assert!(extract("I'm sorry, I cannot help with that.").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn test_scalar_json_is_not_structure() {
        assert!(extract("42").is_none());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let noisy = "Sure!\n```json\n{\"path\": [{\"title\": \"Hooks\", \"skills\": [\"useState\"]}]}\n```";
        let first = extract(noisy).unwrap();
        let second = extract(&first.to_string()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_balanced_span_end_index() {
        let text = "ab[1,[2]]cd";
        assert_eq!(balanced_span(text, 2), Some(9));
    }

    #[test]
    fn test_balanced_span_mismatch() {
        assert_eq!(balanced_span("{]", 0), None);
    }
}
