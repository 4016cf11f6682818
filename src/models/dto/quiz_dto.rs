use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{NewQuiz, OptionLetter, Quiz};

/// A validated question as produced by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneratedQuizItem {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: OptionLetter,
}

impl GeneratedQuizItem {
    pub fn into_new_quiz(self, lecture_id: i64, group_id: &str, source_file_ids: &[i64]) -> NewQuiz {
        NewQuiz {
            lecture_id,
            question: self.question,
            options: [self.option_a, self.option_b, self.option_c, self.option_d],
            correct_option: self.correct_option,
            group_id: group_id.to_string(),
            source_file_ids: source_file_ids.to_vec(),
        }
    }
}

/// Quiz as shown on the listener side; the answer key is only revealed to speakers.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedQuizDto {
    pub id: i64,
    pub lecture_id: i64,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub group_id: String,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<OptionLetter>,
    pub created_at: DateTime<Utc>,
}

impl PublishedQuizDto {
    pub fn from_quiz(quiz: Quiz, reveal_answer: bool) -> Self {
        PublishedQuizDto {
            id: quiz.id,
            lecture_id: quiz.lecture_id,
            question: quiz.question,
            option_a: quiz.option_a,
            option_b: quiz.option_b,
            option_c: quiz.option_c,
            option_d: quiz.option_d,
            group_id: quiz.group_id,
            published: quiz.published,
            correct_option: reveal_answer.then_some(quiz.correct_option),
            created_at: quiz.created_at,
        }
    }
}
