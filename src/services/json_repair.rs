//! Ordered repair cascade for the semi-structured JSON that models return.
//!
//! Strategies run from least to most invasive and stop at the first one
//! that yields a parse:
//!
//! 1. direct parse of the candidate;
//! 2. every balanced `{...}` span, longest first, light-fixed and parsed;
//! 3. light fixes over the whole candidate;
//! 4. aggressive fixes, only parsed when brackets balance afterwards.
//!
//! Strategy 2 assumes the longest balanced object is the payload. That is a
//! heuristic: a long example object in surrounding prose can win over a
//! shorter real payload.

use crate::services::normalizer::matching_close;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::fmt;

// Every pattern below runs on text outside string literals only.
static TRAILING_COMMA_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",[ \t]*([}\]])").expect("valid trailing comma pattern"));
static LEADING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{\[])[ \t]*,").expect("valid leading comma pattern"));
static COMMA_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(?:[ \t]*,)+").expect("valid comma run pattern"));
static TRAILING_COMMA_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma pattern"));
static LINE_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*\r?\n\s*$").expect("valid line gap pattern"));
static CLOSE_BEFORE_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}(\s*)$").expect("valid close-before-string pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    DirectParse,
    BalancedExtraction,
    LightFix,
    AggressiveFix,
}

impl fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepairStrategy::DirectParse => "direct_parse",
            RepairStrategy::BalancedExtraction => "balanced_extraction",
            RepairStrategy::LightFix => "light_fix",
            RepairStrategy::AggressiveFix => "aggressive_fix",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Repaired {
    pub value: JsonValue,
    pub strategy: RepairStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepairError {
    #[error("no JSON candidate to parse")]
    Empty,

    #[error("brackets are unbalanced after aggressive repair")]
    Unbalanced,

    #[error("all repair strategies failed")]
    AllStrategiesFailed,
}

pub fn parse_with_repair(candidate: &str) -> Result<Repaired, RepairError> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(RepairError::Empty);
    }

    if let Ok(value) = serde_json::from_str::<JsonValue>(candidate) {
        return Ok(repaired(value, RepairStrategy::DirectParse));
    }

    let spans = balanced_object_spans(candidate);
    tracing::debug!(spans = spans.len(), "direct parse failed, trying balanced spans");
    for span in spans {
        if let Ok(value) = serde_json::from_str::<JsonValue>(&light_fix(span)) {
            return Ok(repaired(value, RepairStrategy::BalancedExtraction));
        }
    }

    if let Ok(value) = serde_json::from_str::<JsonValue>(&light_fix(candidate)) {
        return Ok(repaired(value, RepairStrategy::LightFix));
    }

    match aggressive_fix(candidate) {
        Ok(fixed) => match serde_json::from_str::<JsonValue>(&fixed) {
            Ok(value) => return Ok(repaired(value, RepairStrategy::AggressiveFix)),
            Err(e) => tracing::debug!(error = %e, "aggressive repair still unparseable"),
        },
        Err(e) => tracing::debug!(error = %e, "aggressive repair rejected"),
    }

    Err(RepairError::AllStrategiesFailed)
}

fn repaired(value: JsonValue, strategy: RepairStrategy) -> Repaired {
    tracing::debug!(%strategy, "JSON candidate parsed");
    Repaired { value, strategy }
}

/// Every balanced `{...}` span in `text`, longest first. Equal lengths keep
/// their order of appearance.
pub fn balanced_object_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans: Vec<&str> = bytes
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == b'{')
        .filter_map(|(start, _)| {
            matching_close(bytes, start, b'{', b'}').map(|end| &text[start..=end])
        })
        .collect();

    spans.sort_by(|a, b| b.len().cmp(&a.len()));
    spans
}

/// Fixes that are safe on almost-valid JSON: trailing and leading commas
/// inside a container, comma runs, and strings left open at end of line.
pub fn light_fix(text: &str) -> String {
    let text = remove_trailing_commas(text);
    let text = remove_leading_commas(&text);
    let text = collapse_comma_runs(&text);
    close_unterminated_strings(&text)
}

/// Light fixes plus comma surgery across line breaks. Fails when the result
/// still has unbalanced brackets.
pub fn aggressive_fix(text: &str) -> Result<String, RepairError> {
    let text = light_fix(text);
    let text = outside_strings(&text, |code| TRAILING_COMMA_ANY.replace_all(code, "$1").into_owned());
    let text = insert_missing_commas(&text);

    if !brackets_balanced(&text) {
        return Err(RepairError::Unbalanced);
    }
    Ok(text)
}

pub fn remove_trailing_commas(text: &str) -> String {
    outside_strings(text, |code| TRAILING_COMMA_INLINE.replace_all(code, "$1").into_owned())
}

pub fn remove_leading_commas(text: &str) -> String {
    outside_strings(text, |code| LEADING_COMMA.replace_all(code, "$1").into_owned())
}

pub fn collapse_comma_runs(text: &str) -> String {
    outside_strings(text, |code| COMMA_RUN.replace_all(code, ",").into_owned())
}

/// Adds the comma a model forgot between two string values on separate
/// lines, and between an object close and the next quoted key.
pub fn insert_missing_commas(text: &str) -> String {
    let segments = split_strings(text);
    let mut out = String::with_capacity(text.len() + 8);

    for (idx, segment) in segments.iter().enumerate() {
        let before_string = segments.get(idx + 1).is_some_and(|next| next.quoted);
        let after_string = idx > 0 && segments[idx - 1].quoted;
        if segment.quoted || !before_string {
            out.push_str(segment.text);
        } else if after_string && LINE_GAP.is_match(segment.text) {
            out.push(',');
            out.push_str(segment.text);
        } else {
            out.push_str(&CLOSE_BEFORE_STRING.replace(segment.text, "},${1}"));
        }
    }
    out
}

/// A run of `text` that is either a whole string literal, quotes included,
/// or the structural text between two literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment<'a> {
    text: &'a str,
    quoted: bool,
}

/// Splits `text` at string literal boundaries. A literal that never closes
/// runs to the end.
fn split_strings(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, b) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                segments.push(Segment { text: &text[start..=idx], quoted: true });
                start = idx + 1;
                in_string = false;
            }
        } else if b == b'"' {
            if start < idx {
                segments.push(Segment { text: &text[start..idx], quoted: false });
            }
            start = idx;
            in_string = true;
        }
    }
    if start < text.len() {
        segments.push(Segment { text: &text[start..], quoted: in_string });
    }
    segments
}

/// Applies `rewrite` to the structural text only; string literals pass
/// through untouched.
fn outside_strings(text: &str, rewrite: impl Fn(&str) -> String) -> String {
    split_strings(text)
        .into_iter()
        .map(|segment| {
            if segment.quoted {
                segment.text.to_string()
            } else {
                rewrite(segment.text)
            }
        })
        .collect()
}

/// A line with an odd number of unescaped quotes has a string that never
/// closed. The quote goes before the line's trailing `,` `}` `]` run, or at
/// the end of the line.
pub fn close_unterminated_strings(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if unescaped_quotes(line) % 2 == 1 {
                close_line(line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn close_line(line: &str) -> String {
    let core = line.trim_end_matches(|c: char| matches!(c, ',' | '}' | ']') || c.is_whitespace());
    let tail = &line[core.len()..];
    format!("{}\"{}", core, tail)
}

fn unescaped_quotes(line: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for c in line.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            count += 1;
        }
    }
    count
}

/// Compares `{`/`}` and `[`/`]` counts outside string literals.
pub fn brackets_balanced(text: &str) -> bool {
    let (mut braces, mut brackets) = (0i64, 0i64);
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
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
            '{' => braces += 1,
            '}' => braces -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            _ => {}
        }
    }

    braces == 0 && brackets == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_parses_directly() {
        let out = parse_with_repair(r#"{"questions": []}"#).unwrap();
        assert_eq!(out.strategy, RepairStrategy::DirectParse);
        assert_eq!(out.value, json!({"questions": []}));
    }

    #[test]
    fn trailing_comma_before_close_is_repaired() {
        let input = r#"{"questions": [{"question":"Q","options":["a","b","c","d"],"correct_answer":"a",}]}"#;
        let out = parse_with_repair(input).unwrap();
        assert_ne!(out.strategy, RepairStrategy::DirectParse);
        assert_eq!(
            out.value["questions"][0]["options"],
            json!(["a", "b", "c", "d"])
        );
        assert_eq!(out.value["questions"][0]["correct_answer"], "a");
    }

    #[test]
    fn empty_candidate_is_an_error() {
        assert_eq!(parse_with_repair("   ").unwrap_err(), RepairError::Empty);
    }

    #[test]
    fn longest_balanced_span_wins() {
        let input = r#"{"short": 1} and then {"longer": [1, 2, 3]}"#;
        let out = parse_with_repair(input).unwrap();
        assert_eq!(out.strategy, RepairStrategy::BalancedExtraction);
        assert_eq!(out.value, json!({"longer": [1, 2, 3]}));
    }

    #[test]
    fn array_with_trailing_comma_uses_light_fix() {
        let out = parse_with_repair("[1, 2, 3,]").unwrap();
        assert_eq!(out.strategy, RepairStrategy::LightFix);
        assert_eq!(out.value, json!([1, 2, 3]));
    }

    #[test]
    fn unterminated_string_is_closed_by_light_fix() {
        let out = parse_with_repair("{\"q\": \"unterminated\n}").unwrap();
        assert_eq!(out.strategy, RepairStrategy::LightFix);
        assert_eq!(out.value, json!({"q": "unterminated"}));
    }

    #[test]
    fn missing_comma_between_lines_needs_aggressive_fix() {
        let input = "{\"questions\": [\n {\"question\": \"Q\"\n \"options\": [\"a\"]}\n]}";
        let out = parse_with_repair(input).unwrap();
        assert_eq!(out.strategy, RepairStrategy::AggressiveFix);
        assert_eq!(
            out.value,
            json!({"questions": [{"question": "Q", "options": ["a"]}]})
        );
    }

    #[test]
    fn trailing_comma_across_newline_needs_aggressive_fix() {
        let out = parse_with_repair("{\"a\": [1, 2,\n]}").unwrap();
        assert_eq!(out.strategy, RepairStrategy::AggressiveFix);
        assert_eq!(out.value, json!({"a": [1, 2]}));
    }

    #[test]
    fn missing_comma_after_object_close() {
        let input = "[\n{\"a\": 1}\n\"b\"\n]";
        let fixed = insert_missing_commas(input);
        assert_eq!(fixed, "[\n{\"a\": 1},\n\"b\"\n]");
    }

    #[test]
    fn closing_characters_inside_strings_survive_aggressive_fix() {
        let input = "{\"questions\": [\n{\"question\": \"Which character closes a block in C? }\"\n\"options\": [\"}\", \")\", \"]\", \">\"],\n\"correct_answer\": \"}\"}\n]}";
        let out = parse_with_repair(input).unwrap();
        assert_eq!(out.strategy, RepairStrategy::AggressiveFix);
        let question = &out.value["questions"][0];
        assert_eq!(question["question"], "Which character closes a block in C? }");
        assert_eq!(question["options"], json!(["}", ")", "]", ">"]));
        assert_eq!(question["correct_answer"], "}");
    }

    #[test]
    fn comma_fixes_leave_string_contents_alone() {
        assert_eq!(remove_trailing_commas(r#"{"a": "x, ]", }"#), r#"{"a": "x, ]"}"#);
        assert_eq!(remove_leading_commas(r#"["[ ,", 1]"#), r#"["[ ,", 1]"#);
        assert_eq!(collapse_comma_runs(r#"["a,,b",, "c"]"#), r#"["a,,b", "c"]"#);
        assert_eq!(
            insert_missing_commas("{\"a\": \"}\"\n}"),
            "{\"a\": \"}\"\n}"
        );
        assert_eq!(
            insert_missing_commas("[\"say \\\"}\\\" \"\n\"b\"]"),
            "[\"say \\\"}\\\" \",\n\"b\"]"
        );
    }

    #[test]
    fn splits_on_string_boundaries() {
        let segments = split_strings(r#"{"k": "v\"}"} "open"#);
        let texts: Vec<(&str, bool)> = segments.iter().map(|s| (s.text, s.quoted)).collect();
        assert_eq!(
            texts,
            vec![
                ("{", false),
                (r#""k""#, true),
                (": ", false),
                (r#""v\"}""#, true),
                ("} ", false),
                (r#""open"#, true),
            ]
        );
    }

    #[test]
    fn unbalanced_input_gives_up() {
        assert_eq!(
            parse_with_repair(r#"{"questions": [1, 2"#).unwrap_err(),
            RepairError::AllStrategiesFailed
        );
        assert_eq!(
            aggressive_fix(r#"{"questions": [1, 2"#).unwrap_err(),
            RepairError::Unbalanced
        );
    }

    #[test]
    fn prose_without_json_gives_up() {
        assert_eq!(
            parse_with_repair("no quiz today").unwrap_err(),
            RepairError::AllStrategiesFailed
        );
    }

    #[test]
    fn light_fix_steps() {
        assert_eq!(remove_trailing_commas(r#"{"a": 1 , }"#), r#"{"a": 1 }"#);
        assert_eq!(remove_leading_commas(r#"[ , 1, 2]"#), r#"[ 1, 2]"#);
        assert_eq!(collapse_comma_runs(r#"["a",, ,"b"]"#), r#"["a","b"]"#);
    }

    #[test]
    fn closes_strings_before_trailing_punctuation() {
        assert_eq!(
            close_unterminated_strings("\"question\": \"Who was,"),
            "\"question\": \"Who was\","
        );
        assert_eq!(
            close_unterminated_strings("\"options\": [\"a\", \"b"),
            "\"options\": [\"a\", \"b\""
        );
        assert_eq!(
            close_unterminated_strings(r#""say \"hi\""#),
            r#""say \"hi\"""#
        );
        assert_eq!(
            close_unterminated_strings("{\"ok\": \"fine\"}\n\"x}"),
            "{\"ok\": \"fine\"}\n\"x\"}"
        );
    }

    #[test]
    fn bracket_balance_ignores_string_contents() {
        assert!(brackets_balanced(r#"{"a": ["}"]}"#));
        assert!(!brackets_balanced(r#"{"a": [1}"#));
        assert!(!brackets_balanced(r#"{"a": 1}}"#));
    }

    #[test]
    fn spans_are_sorted_longest_first() {
        let spans = balanced_object_spans(r#"{"a": {"b": 1}} {"c": 22}"#);
        assert_eq!(spans, vec![r#"{"a": {"b": 1}}"#, r#"{"c": 22}"#, r#"{"b": 1}"#]);
    }
}
