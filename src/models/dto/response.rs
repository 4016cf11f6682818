use serde::Serialize;

use crate::models::{
    domain::{
        Answer, GroupStats, LeaderboardEntry, LectureStats, OptionLetter, Quiz, UserLectureStats,
    },
    dto::quiz_dto::GeneratedQuizItem,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub message: String,
    #[serde(rename = "quizIds")]
    pub quiz_ids: Vec<i64>,
    pub group_id: String,
    pub data: Vec<GeneratedQuizItem>,
    pub info: String,
}

#[derive(Debug, Serialize)]
pub struct GroupIdsResponse {
    pub success: bool,
    pub data: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub success: bool,
    pub message: String,
    pub is_correct: bool,
    pub correct_answer: OptionLetter,
    pub selected_option: OptionLetter,
    pub submit_count: i32,
}

/// An answer row joined with the question it answers.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerDetail {
    #[serde(flatten)]
    pub answer: Answer,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl AnswerDetail {
    pub fn new(answer: Answer, quiz: &Quiz) -> Self {
        AnswerDetail {
            answer,
            question: quiz.question.clone(),
            option_a: quiz.option_a.clone(),
            option_b: quiz.option_b.clone(),
            option_c: quiz.option_c.clone(),
            option_d: quiz.option_d.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyAnswersResponse {
    pub answers: Vec<AnswerDetail>,
    pub stats: UserLectureStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureOverviewResponse {
    pub lecture_stats: LectureStats,
    pub group_stats: Vec<GroupStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatisticsItem {
    pub quiz_id: i64,
    pub question: String,
    pub total_answers: i64,
    pub correct_answers: i64,
    pub accuracy_rate: f64,
    pub avg_answer_time_ms: Option<f64>,
}

pub type LeaderboardResponse = ApiResponse<Vec<LeaderboardEntry>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_answer_response_uses_camel_case_keys() {
        let response = SubmitAnswerResponse {
            success: true,
            message: "Answer saved".to_string(),
            is_correct: true,
            correct_answer: OptionLetter::B,
            selected_option: OptionLetter::B,
            submit_count: 1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isCorrect"], true);
        assert_eq!(json["correctAnswer"], "B");
        assert_eq!(json["selectedOption"], "B");
    }

    #[test]
    fn generate_response_keeps_mixed_key_style() {
        let response = GenerateQuizResponse {
            message: "ok".to_string(),
            quiz_ids: vec![1, 2],
            group_id: "3".to_string(),
            data: vec![],
            info: String::new(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["quizIds"], serde_json::json!([1, 2]));
        assert_eq!(json["group_id"], "3");
    }
}
