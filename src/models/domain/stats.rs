use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizStats {
    pub quiz_id: i64,
    pub total_answers: i64,
    pub correct_answers: i64,
    pub accuracy_rate: f64,
    pub avg_answer_time_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserLectureStats {
    pub user_id: i64,
    pub lecture_id: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub accuracy_rate: f64, // Percentage, one decimal place
    pub groups_participated: i64,
    pub avg_answer_time_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GroupStats {
    pub group_id: String,
    pub lecture_id: i64,
    pub questions_count: i64,
    pub participants_count: i64,
    pub total_answers: i64,
    pub correct_answers: i64,
    pub accuracy_rate: f64, // Percentage, two decimal places
    pub avg_answer_time_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LectureStats {
    pub lecture_id: i64,
    pub participants_count: i64,
    pub questions_count: i64,
    pub groups_count: i64,
    pub total_answers: i64,
    pub correct_answers: i64,
    pub overall_accuracy_rate: f64,
    pub avg_answer_time_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub accuracy_rate: f64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub avg_answer_time_ms: Option<f64>,
}

impl From<UserLectureStats> for LeaderboardEntry {
    fn from(stats: UserLectureStats) -> Self {
        LeaderboardEntry {
            user_id: stats.user_id,
            accuracy_rate: stats.accuracy_rate,
            total_questions: stats.total_questions,
            correct_answers: stats.correct_answers,
            avg_answer_time_ms: stats.avg_answer_time_ms,
        }
    }
}

impl QuizStats {
    pub fn empty(quiz_id: i64) -> Self {
        QuizStats {
            quiz_id,
            total_answers: 0,
            correct_answers: 0,
            accuracy_rate: 0.0,
            avg_answer_time_ms: None,
        }
    }
}

impl LectureStats {
    pub fn empty(lecture_id: i64) -> Self {
        LectureStats {
            lecture_id,
            participants_count: 0,
            questions_count: 0,
            groups_count: 0,
            total_answers: 0,
            correct_answers: 0,
            overall_accuracy_rate: 0.0,
            avg_answer_time_ms: None,
        }
    }
}
