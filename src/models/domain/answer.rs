use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::quiz::{OptionLetter, Quiz};

/// One row per (quiz, user); resubmissions update it in place.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Answer {
    pub quiz_id: i64,
    pub user_id: i64,
    pub lecture_id: i64,
    pub user_answer: String,
    pub selected_option: OptionLetter,
    pub correct_answer: String,
    pub correct_option: OptionLetter,
    pub is_correct: bool,
    pub answer_time_ms: Option<i64>,
    pub group_id: String,
    pub submit_count: i32,
    pub answered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert or update an answer row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerSubmission {
    pub quiz_id: i64,
    pub user_id: i64,
    pub lecture_id: i64,
    pub user_answer: String,
    pub selected_option: OptionLetter,
    pub correct_answer: String,
    pub correct_option: OptionLetter,
    pub is_correct: bool,
    pub answer_time_ms: Option<i64>,
    pub group_id: String,
}

impl AnswerSubmission {
    pub fn for_quiz(
        quiz: &Quiz,
        user_id: i64,
        user_answer: &str,
        selected_option: OptionLetter,
        answer_time_ms: Option<i64>,
    ) -> Self {
        AnswerSubmission {
            quiz_id: quiz.id,
            user_id,
            lecture_id: quiz.lecture_id,
            user_answer: user_answer.to_string(),
            selected_option,
            correct_answer: quiz.correct_answer_text().to_string(),
            correct_option: quiz.correct_option,
            is_correct: selected_option == quiz.correct_option,
            answer_time_ms,
            group_id: quiz.group_id.clone(),
        }
    }

    /// Row created by the first submission.
    pub fn into_first_answer(self, now: DateTime<Utc>) -> Answer {
        Answer {
            quiz_id: self.quiz_id,
            user_id: self.user_id,
            lecture_id: self.lecture_id,
            user_answer: self.user_answer,
            selected_option: self.selected_option,
            correct_answer: self.correct_answer,
            correct_option: self.correct_option,
            is_correct: self.is_correct,
            answer_time_ms: self.answer_time_ms,
            group_id: self.group_id,
            submit_count: 1,
            answered_at: now,
            updated_at: now,
        }
    }
}

impl Answer {
    /// Merge a resubmission: mutable fields replaced, counter bumped.
    pub fn apply_resubmission(&mut self, submission: AnswerSubmission, now: DateTime<Utc>) {
        self.user_answer = submission.user_answer;
        self.selected_option = submission.selected_option;
        self.correct_answer = submission.correct_answer;
        self.correct_option = submission.correct_option;
        self.is_correct = submission.is_correct;
        self.answer_time_ms = submission.answer_time_ms;
        self.group_id = submission.group_id;
        self.lecture_id = submission.lecture_id;
        self.submit_count += 1;
        self.updated_at = now;
    }
}
