use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::domain::OptionLetter;

/// A single repair heuristic for a model-provided `correct_option`.
pub type LetterStrategy = fn(&str, &[&str; 4]) -> Option<OptionLetter>;

static EMBEDDED_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[ABCD]").unwrap());
static OUT_OF_RANGE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[EFGH]").unwrap());
static OPTION_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[1-4]").unwrap());

const ORDINALS: [(&str, OptionLetter); 12] = [
    ("1", OptionLetter::A),
    ("一", OptionLetter::A),
    ("第一", OptionLetter::A),
    ("2", OptionLetter::B),
    ("二", OptionLetter::B),
    ("第二", OptionLetter::B),
    ("3", OptionLetter::C),
    ("三", OptionLetter::C),
    ("第三", OptionLetter::C),
    ("4", OptionLetter::D),
    ("四", OptionLetter::D),
    ("第四", OptionLetter::D),
];

const OPTION_PREFIX_CHARS: usize = 10;

pub fn exact_letter(raw: &str, _options: &[&str; 4]) -> Option<OptionLetter> {
    OptionLetter::parse_exact(raw)
}

/// "选项B", "(c)", "Answer: D." and the like. First A-D letter wins.
pub fn embedded_letter(raw: &str, _options: &[&str; 4]) -> Option<OptionLetter> {
    EMBEDDED_LETTER
        .find(raw)
        .and_then(|m| OptionLetter::parse_exact(m.as_str()))
}

pub fn ordinal(raw: &str, _options: &[&str; 4]) -> Option<OptionLetter> {
    ORDINALS
        .iter()
        .find(|(token, _)| raw.contains(token))
        .map(|(_, letter)| *letter)
}

/// E..H shifted back onto A..D.
pub fn out_of_range_letter(raw: &str, _options: &[&str; 4]) -> Option<OptionLetter> {
    let m = OUT_OF_RANGE_LETTER.find(raw)?;
    match m.as_str().to_ascii_uppercase().as_str() {
        "E" => Some(OptionLetter::A),
        "F" => Some(OptionLetter::B),
        "G" => Some(OptionLetter::C),
        "H" => Some(OptionLetter::D),
        _ => None,
    }
}

/// The model answered with option text instead of a letter.
pub fn option_prefix(raw: &str, options: &[&str; 4]) -> Option<OptionLetter> {
    options.iter().enumerate().find_map(|(index, text)| {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let prefix: String = text.chars().take(OPTION_PREFIX_CHARS).collect();
        if raw.contains(&prefix) {
            OptionLetter::from_index(index)
        } else {
            None
        }
    })
}

pub fn any_digit(raw: &str, _options: &[&str; 4]) -> Option<OptionLetter> {
    let m = OPTION_DIGIT.find(raw)?;
    let digit: usize = m.as_str().parse().ok()?;
    OptionLetter::from_index(digit - 1)
}

/// Tried in order; the first strategy that yields a letter wins.
pub const STRATEGIES: [(&str, LetterStrategy); 6] = [
    ("exact", exact_letter),
    ("embedded_letter", embedded_letter),
    ("ordinal", ordinal),
    ("out_of_range_letter", out_of_range_letter),
    ("option_prefix", option_prefix),
    ("any_digit", any_digit),
];

/// Resolves a raw `correct_option` onto A-D, returning the strategy that matched.
pub fn resolve_letter(raw: &str, options: &[&str; 4]) -> Option<(OptionLetter, &'static str)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(raw, options).map(|letter| (letter, *name)))
}
