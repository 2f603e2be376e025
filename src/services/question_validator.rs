use crate::models::question::{Difficulty, QuestionType, ValidatedQuestion, OPTION_COUNT};
use serde_json::Value as JsonValue;

/// Filters the parsed payload down to schema-conformant questions. A bad
/// question is dropped on its own; input order is kept for the rest.
pub fn sanitize(parsed: &JsonValue) -> Vec<ValidatedQuestion> {
    let items: &[JsonValue] = match parsed {
        JsonValue::Object(map) => match map.get("questions") {
            Some(JsonValue::Array(items)) => items.as_slice(),
            _ => &[],
        },
        JsonValue::Array(items) => items.as_slice(),
        _ => &[],
    };

    let total = items.len();
    let questions: Vec<ValidatedQuestion> = items.iter().filter_map(validate_question).collect();

    if questions.len() < total {
        tracing::info!(
            kept = questions.len(),
            dropped = total - questions.len(),
            "discarded invalid quiz questions"
        );
    }
    questions
}

pub fn validate_question(value: &JsonValue) -> Option<ValidatedQuestion> {
    let record = value.as_object()?;

    let question = record.get("question")?.as_str()?.trim();
    if question.is_empty() {
        return None;
    }

    let options = sanitize_options(record.get("options")?)?;

    let correct_answer = scalar_text(record.get("correct_answer")?)?;
    if !options.iter().any(|o| *o == correct_answer) {
        return None;
    }

    let difficulty = record
        .get("difficulty")
        .and_then(JsonValue::as_str)
        .map(Difficulty::parse_or_default)
        .unwrap_or_default();

    Some(ValidatedQuestion {
        question_type: QuestionType::MultipleChoice,
        question: question.to_string(),
        options,
        correct_answer,
        difficulty,
    })
}

fn sanitize_options(value: &JsonValue) -> Option<Vec<String>> {
    let raw = value.as_array()?;
    if raw.len() != OPTION_COUNT {
        return None;
    }

    let options: Vec<String> = raw.iter().filter_map(scalar_text).collect();
    (options.len() == OPTION_COUNT).then_some(options)
}

/// Trimmed text of a string, number or bool; `None` for anything else or
/// when nothing is left after trimming.
fn scalar_text(value: &JsonValue) -> Option<String> {
    let text = match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
