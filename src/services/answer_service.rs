use std::{collections::HashMap, sync::Arc};

use validator::Validate;

use crate::{
    config::UnresolvedAnswerPolicy,
    errors::{AppError, AppResult},
    models::{
        domain::{AnswerSubmission, OptionLetter, Quiz},
        dto::{
            request::SubmitAnswerRequest,
            response::{AnswerDetail, MyAnswersResponse, SubmitAnswerResponse},
        },
    },
    repositories::{AnswerRepository, QuizRepository},
    services::statistics_service::StatisticsService,
};

/// Maps a submitted answer (option text or letter) onto the option letter it names.
///
/// Option text wins over a bare letter, so an option whose text is literally "B"
/// is matched by content first.
pub fn normalize_answer(options: [&str; 4], raw: &str) -> Option<OptionLetter> {
    let raw = raw.trim();
    options
        .iter()
        .position(|text| text.trim() == raw)
        .and_then(OptionLetter::from_index)
        .or_else(|| OptionLetter::parse_exact(raw))
}

pub struct AnswerService {
    quizzes: Arc<dyn QuizRepository>,
    answers: Arc<dyn AnswerRepository>,
    statistics: Arc<StatisticsService>,
    policy: UnresolvedAnswerPolicy,
}

impl AnswerService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        answers: Arc<dyn AnswerRepository>,
        statistics: Arc<StatisticsService>,
        policy: UnresolvedAnswerPolicy,
    ) -> Self {
        Self {
            quizzes,
            answers,
            statistics,
            policy,
        }
    }

    fn resolve_letter(&self, quiz: &Quiz, user_id: i64, raw: &str) -> AppResult<OptionLetter> {
        if let Some(letter) = normalize_answer(quiz.options(), raw) {
            return Ok(letter);
        }

        match self.policy {
            UnresolvedAnswerPolicy::Reject => {
                log::warn!(
                    "Rejected unresolvable answer {:?} from user {} for quiz {}",
                    raw,
                    user_id,
                    quiz.id
                );
                Err(AppError::ValidationError(
                    "Answer does not match any option".to_string(),
                ))
            }
            UnresolvedAnswerPolicy::DefaultTo(letter) => {
                log::warn!(
                    "Unresolvable answer {:?} from user {} for quiz {} scored as {}",
                    raw,
                    user_id,
                    quiz.id,
                    letter
                );
                Ok(letter)
            }
        }
    }

    pub async fn submit_answer(
        &self,
        quiz_id: i64,
        user_id: i64,
        request: &SubmitAnswerRequest,
    ) -> AppResult<SubmitAnswerResponse> {
        request.validate()?;

        let raw = request
            .raw_answer()
            .ok_or_else(|| AppError::ValidationError("answer is required".to_string()))?;

        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;

        let selected = self.resolve_letter(&quiz, user_id, raw)?;
        let submission =
            AnswerSubmission::for_quiz(&quiz, user_id, raw, selected, request.answer_time_ms);
        let answer = self.answers.upsert(submission).await?;

        log::info!(
            "User {} answered quiz {} with {} (correct: {}, submission #{})",
            user_id,
            quiz_id,
            selected,
            answer.is_correct,
            answer.submit_count
        );

        let message = if answer.submit_count > 1 {
            "Answer updated"
        } else {
            "Answer submitted"
        };

        Ok(SubmitAnswerResponse {
            success: true,
            message: message.to_string(),
            is_correct: answer.is_correct,
            correct_answer: quiz.correct_option,
            selected_option: answer.selected_option,
            submit_count: answer.submit_count,
        })
    }

    /// A user's answers in a lecture joined with their questions, oldest first.
    pub async fn user_answers(&self, lecture_id: i64, user_id: i64) -> AppResult<Vec<AnswerDetail>> {
        let answers = self
            .answers
            .find_by_lecture_and_user(lecture_id, user_id)
            .await?;

        let quiz_ids: Vec<i64> = answers.iter().map(|a| a.quiz_id).collect();
        let quizzes: HashMap<i64, Quiz> = self
            .quizzes
            .find_by_ids(&quiz_ids)
            .await?
            .into_iter()
            .map(|quiz| (quiz.id, quiz))
            .collect();

        // answers to deleted quizzes are dropped
        Ok(answers
            .into_iter()
            .filter_map(|answer| {
                let quiz = quizzes.get(&answer.quiz_id)?;
                Some(AnswerDetail::new(answer, quiz))
            })
            .collect())
    }

    pub async fn my_answers(&self, lecture_id: i64, user_id: i64) -> AppResult<MyAnswersResponse> {
        let answers = self.user_answers(lecture_id, user_id).await?;
        let stats = self.statistics.user_stats(lecture_id, user_id).await?;
        Ok(MyAnswersResponse { answers, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{Answer, NewQuiz},
        repositories::{
            answer_repository::MockAnswerRepository, quiz_repository::MockQuizRepository,
        },
    };
    use chrono::Utc;

    const OPTIONS: [&str; 4] = ["Paris", "B", "Rome", "Madrid"];

    fn quiz() -> Quiz {
        Quiz::from_new(
            7,
            NewQuiz {
                lecture_id: 100,
                question: "Capital of France?".to_string(),
                options: ["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
                correct_option: OptionLetter::A,
                group_id: "1".to_string(),
                source_file_ids: vec![],
            },
        )
    }

    fn service(
        quizzes: MockQuizRepository,
        answers: MockAnswerRepository,
        policy: UnresolvedAnswerPolicy,
    ) -> AnswerService {
        let quizzes: Arc<dyn QuizRepository> = Arc::new(quizzes);
        let answers: Arc<dyn AnswerRepository> = Arc::new(answers);
        let statistics = Arc::new(StatisticsService::new(answers.clone(), quizzes.clone(), None));
        AnswerService::new(quizzes, answers, statistics, policy)
    }

    fn request(answer: &str) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            answer: Some(answer.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn option_text_matches_before_letters() {
        assert_eq!(normalize_answer(OPTIONS, "Rome"), Some(OptionLetter::C));
        assert_eq!(normalize_answer(OPTIONS, " Madrid "), Some(OptionLetter::D));
        // "B" is the text of option B and also a letter; both agree here
        assert_eq!(normalize_answer(OPTIONS, "B"), Some(OptionLetter::B));
        assert_eq!(
            normalize_answer(["C", "x", "y", "z"], "C"),
            Some(OptionLetter::A)
        );
    }

    #[test]
    fn bare_letters_are_case_insensitive() {
        assert_eq!(normalize_answer(OPTIONS, "d"), Some(OptionLetter::D));
        assert_eq!(normalize_answer(OPTIONS, "Berlin"), None);
    }

    #[tokio::test]
    async fn submit_upserts_and_reports_correctness() {
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .withf(|id| *id == 7)
            .returning(|_| Ok(Some(quiz())));

        let mut answers = MockAnswerRepository::new();
        answers
            .expect_upsert()
            .withf(|s| s.selected_option == OptionLetter::A && s.is_correct && s.user_id == 3)
            .times(1)
            .returning(|s| Ok(s.into_first_answer(Utc::now())));

        let response = service(quizzes, answers, UnresolvedAnswerPolicy::Reject)
            .submit_answer(7, 3, &request("Paris"))
            .await
            .unwrap();

        assert!(response.is_correct);
        assert_eq!(response.selected_option, OptionLetter::A);
        assert_eq!(response.submit_count, 1);
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_find_by_id().returning(|_| Ok(None));

        let err = service(quizzes, MockAnswerRepository::new(), UnresolvedAnswerPolicy::Reject)
            .submit_answer(404, 3, &request("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_answer_is_a_validation_error() {
        let err = service(
            MockQuizRepository::new(),
            MockAnswerRepository::new(),
            UnresolvedAnswerPolicy::Reject,
        )
        .submit_answer(7, 3, &SubmitAnswerRequest::default())
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn unresolvable_answers_follow_the_policy() {
        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_find_by_id().returning(|_| Ok(Some(quiz())));
        let mut answers = MockAnswerRepository::new();
        answers.expect_upsert().times(0);

        let err = service(quizzes, answers, UnresolvedAnswerPolicy::Reject)
            .submit_answer(7, 3, &request("Berlin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_find_by_id().returning(|_| Ok(Some(quiz())));
        let mut answers = MockAnswerRepository::new();
        answers
            .expect_upsert()
            .times(1)
            .returning(|s| Ok(s.into_first_answer(Utc::now())));

        let response = service(
            quizzes,
            answers,
            UnresolvedAnswerPolicy::DefaultTo(OptionLetter::A),
        )
        .submit_answer(7, 3, &request("Berlin"))
        .await
        .unwrap();
        assert_eq!(response.selected_option, OptionLetter::A);
    }

    #[tokio::test]
    async fn answers_to_deleted_quizzes_are_omitted() {
        let now = Utc::now();
        let kept: Answer =
            AnswerSubmission::for_quiz(&quiz(), 3, "Paris", OptionLetter::A, None).into_first_answer(now);
        let mut orphan = kept.clone();
        orphan.quiz_id = 8;

        let mut answers = MockAnswerRepository::new();
        answers
            .expect_find_by_lecture_and_user()
            .returning(move |_, _| Ok(vec![kept.clone(), orphan.clone()]));

        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_ids()
            .returning(|_| Ok(vec![quiz()]));

        let details = service(quizzes, answers, UnresolvedAnswerPolicy::Reject)
            .user_answers(100, 3)
            .await
            .unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].question, "Capital of France?");
    }
}
