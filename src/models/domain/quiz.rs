use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical option letter of a four-option question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            OptionLetter::A => 0,
            OptionLetter::B => 1,
            OptionLetter::C => 2,
            OptionLetter::D => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        }
    }

    /// Case-insensitive match of a bare letter, surrounding whitespace ignored.
    pub fn parse_exact(raw: &str) -> Option<Self> {
        match raw.trim() {
            "A" | "a" => Some(OptionLetter::A),
            "B" | "b" => Some(OptionLetter::B),
            "C" | "c" => Some(OptionLetter::C),
            "D" | "d" => Some(OptionLetter::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_exact(s).ok_or_else(|| format!("'{}' is not an option letter", s))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub lecture_id: i64,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: OptionLetter,
    pub group_id: String, // Positive integer, sequential per lecture
    pub published: bool,
    pub source_file_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// A quiz that has been validated but not yet assigned an id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewQuiz {
    pub lecture_id: i64,
    pub question: String,
    pub options: [String; 4],
    pub correct_option: OptionLetter,
    pub group_id: String,
    pub source_file_ids: Vec<i64>,
}

impl Quiz {
    pub fn from_new(id: i64, new_quiz: NewQuiz) -> Self {
        let [option_a, option_b, option_c, option_d] = new_quiz.options;
        Quiz {
            id,
            lecture_id: new_quiz.lecture_id,
            question: new_quiz.question,
            option_a,
            option_b,
            option_c,
            option_d,
            correct_option: new_quiz.correct_option,
            group_id: new_quiz.group_id,
            published: false,
            source_file_ids: new_quiz.source_file_ids,
            created_at: Utc::now(),
        }
    }

    pub fn options(&self) -> [&str; 4] {
        [
            self.option_a.as_str(),
            self.option_b.as_str(),
            self.option_c.as_str(),
            self.option_d.as_str(),
        ]
    }

    pub fn option_text(&self, letter: OptionLetter) -> &str {
        self.options()[letter.index()]
    }

    pub fn correct_answer_text(&self) -> &str {
        self.option_text(self.correct_option)
    }

    /// Numeric value of the group id; non-numeric legacy ids sort last.
    pub fn group_number(&self) -> u64 {
        group_number(&self.group_id).unwrap_or(u64::MAX)
    }
}

pub fn group_number(group_id: &str) -> Option<u64> {
    let trimmed = group_id.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Next group number for a lecture: `max(existing numeric ids) + 1`, starting at 1.
pub fn next_group_number<S: AsRef<str>>(existing: &[S]) -> u64 {
    existing
        .iter()
        .filter_map(|g| group_number(g.as_ref()))
        .max()
        .unwrap_or(0)
        + 1
}
