use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{
    errors::GenerationError,
    models::dto::quiz_dto::GeneratedQuizItem,
    services::generation::letter::resolve_letter,
};

const REASONING_END: &str = "</think>";
const OPTION_KEYS: [&str; 4] = ["option_a", "option_b", "option_c", "option_d"];

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

/// Drops a reasoning preamble (everything up to the closing `</think>`).
pub fn strip_reasoning(raw: &str) -> &str {
    match raw.find(REASONING_END) {
        Some(pos) => raw[pos + REASONING_END.len()..].trim(),
        None => raw,
    }
}

/// End index (exclusive) of the balanced array starting at `start`, if it closes.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// First balanced `[...]` span; falls back to first `[` through last `]`.
pub fn extract_json_array(text: &str) -> Option<&str> {
    for (start, _) in text.match_indices('[') {
        if let Some(end) = balanced_end(text, start) {
            return Some(&text[start..end]);
        }
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Removes stray control characters and normalises line endings.
pub fn sanitize(json: &str) -> String {
    let normalized = json
        .replace('\t', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    CONTROL_CHARS.replace_all(&normalized, "").into_owned()
}

fn required_text(item: &Value, key: &str, number: usize) -> Result<String, GenerationError> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            GenerationError::InvalidItem(format!("question {} has an empty or missing {}", number, key))
        })
}

fn raw_correct_option(item: &Value) -> Option<String> {
    match item.get("correct_option")? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn validate_item(item: &Value, number: usize) -> Result<GeneratedQuizItem, GenerationError> {
    if !item.is_object() {
        return Err(GenerationError::InvalidItem(format!(
            "question {} is not an object",
            number
        )));
    }

    let question = required_text(item, "question", number)?;
    let [option_a, option_b, option_c, option_d] = [
        required_text(item, OPTION_KEYS[0], number)?,
        required_text(item, OPTION_KEYS[1], number)?,
        required_text(item, OPTION_KEYS[2], number)?,
        required_text(item, OPTION_KEYS[3], number)?,
    ];

    let raw = raw_correct_option(item).ok_or_else(|| {
        GenerationError::InvalidAnswer(format!("question {} has no correct_option", number))
    })?;

    let options = [
        option_a.as_str(),
        option_b.as_str(),
        option_c.as_str(),
        option_d.as_str(),
    ];
    let (correct_option, strategy) = resolve_letter(&raw, &options).ok_or_else(|| {
        GenerationError::InvalidAnswer(format!(
            "question {} has unrecognised correct_option {:?}",
            number, raw
        ))
    })?;

    if strategy != "exact" {
        log::info!(
            "Repaired correct_option {:?} of question {} to {} ({})",
            raw,
            number,
            correct_option,
            strategy
        );
    }

    Ok(GeneratedQuizItem {
        question,
        option_a,
        option_b,
        option_c,
        option_d,
        correct_option,
    })
}

/// Turns raw model output into exactly `batch_size` validated items, or fails the whole batch.
pub fn parse_quiz_batch(
    raw: &str,
    batch_size: usize,
) -> Result<Vec<GeneratedQuizItem>, GenerationError> {
    let cleaned = strip_reasoning(raw);
    let span = extract_json_array(cleaned)
        .or_else(|| extract_json_array(raw))
        .ok_or_else(|| GenerationError::MalformedOutput("no JSON array found".to_string()))?;

    let value: Value = serde_json::from_str(&sanitize(span))
        .map_err(|e| GenerationError::MalformedOutput(e.to_string()))?;

    let items = value.as_array().ok_or_else(|| {
        GenerationError::MalformedOutput("top-level value is not an array".to_string())
    })?;

    if items.is_empty() {
        return Err(GenerationError::InvalidItem("no questions generated".to_string()));
    }

    let mut quizzes = items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_item(item, index + 1))
        .collect::<Result<Vec<_>, _>>()?;

    if quizzes.len() < batch_size {
        return Err(GenerationError::InvalidItem(format!(
            "expected {} questions, got {}",
            batch_size,
            quizzes.len()
        )));
    }

    quizzes.truncate(batch_size);
    Ok(quizzes)
}
