use std::sync::Arc;

use crate::{
    errors::AppResult,
    models::{
        domain::{
            quiz::group_number, GroupStats, LeaderboardEntry, LectureStats, QuizStats,
            UserLectureStats,
        },
        dto::response::{LectureOverviewResponse, QuizStatisticsItem},
    },
    repositories::{AnswerRepository, QuizRepository, StatsViewRepository},
    services::{
        aggregation,
        leaderboard::{self, LeaderboardLimit},
    },
};

/// Keeps a view result only when it carries data; anything else means "recompute".
fn usable<T>(what: &str, result: AppResult<Option<T>>, has_data: impl Fn(&T) -> bool) -> Option<T> {
    match result {
        Ok(Some(value)) if has_data(&value) => Some(value),
        Ok(_) => {
            log::debug!("View returned nothing for {}, recomputing from answers", what);
            None
        }
        Err(err) => {
            log::warn!("View lookup for {} failed, recomputing from answers: {}", what, err);
            None
        }
    }
}

pub struct StatisticsService {
    answers: Arc<dyn AnswerRepository>,
    quizzes: Arc<dyn QuizRepository>,
    views: Option<Arc<dyn StatsViewRepository>>,
}

impl StatisticsService {
    pub fn new(
        answers: Arc<dyn AnswerRepository>,
        quizzes: Arc<dyn QuizRepository>,
        views: Option<Arc<dyn StatsViewRepository>>,
    ) -> Self {
        Self {
            answers,
            quizzes,
            views,
        }
    }

    pub async fn quiz_stats(&self, quiz_id: i64) -> AppResult<QuizStats> {
        if let Some(views) = &self.views {
            let what = format!("quiz {}", quiz_id);
            if let Some(stats) = usable(&what, views.quiz_stats(quiz_id).await, |s| s.total_answers > 0) {
                return Ok(stats);
            }
        }

        let answers = self.answers.find_by_quiz(quiz_id).await?;
        Ok(aggregation::quiz_stats(quiz_id, &answers))
    }

    pub async fn user_stats(&self, lecture_id: i64, user_id: i64) -> AppResult<UserLectureStats> {
        if let Some(views) = &self.views {
            let what = format!("user {} in lecture {}", user_id, lecture_id);
            let result = views.user_stats(lecture_id, user_id).await;
            if let Some(stats) = usable(&what, result, |s| s.total_questions > 0) {
                return Ok(stats);
            }
        }

        let answers = self
            .answers
            .find_by_lecture_and_user(lecture_id, user_id)
            .await?;
        Ok(aggregation::user_lecture_stats(lecture_id, user_id, &answers))
    }

    pub async fn group_stats(&self, lecture_id: i64, group_id: &str) -> AppResult<GroupStats> {
        let answers = self.answers.find_by_group(lecture_id, group_id).await?;
        Ok(aggregation::group_stats(lecture_id, group_id, &answers))
    }

    pub async fn lecture_stats(&self, lecture_id: i64) -> AppResult<LectureStats> {
        if let Some(views) = &self.views {
            let what = format!("lecture {}", lecture_id);
            let result = views.lecture_stats(lecture_id).await;
            if let Some(stats) = usable(&what, result, |s| s.total_answers > 0) {
                return Ok(stats);
            }
        }

        let answers = self.answers.find_by_lecture(lecture_id).await?;
        Ok(aggregation::lecture_stats(lecture_id, &answers))
    }

    /// Lecture totals plus one entry per quiz group, groups in numeric order.
    pub async fn lecture_overview(&self, lecture_id: i64) -> AppResult<LectureOverviewResponse> {
        let lecture_stats = self.lecture_stats(lecture_id).await?;

        let mut group_ids = self.quizzes.group_ids(lecture_id).await?;
        group_ids.sort_by_key(|g| (group_number(g).unwrap_or(u64::MAX), g.clone()));

        let mut group_stats = Vec::with_capacity(group_ids.len());
        for group_id in &group_ids {
            group_stats.push(self.group_stats(lecture_id, group_id).await?);
        }

        Ok(LectureOverviewResponse {
            lecture_stats,
            group_stats,
        })
    }

    /// Per-quiz statistics for every quiz of the lecture, including unanswered ones.
    pub async fn lecture_quiz_statistics(&self, lecture_id: i64) -> AppResult<Vec<QuizStatisticsItem>> {
        let mut quizzes = self.quizzes.list_by_lecture(lecture_id).await?;
        quizzes.sort_by_key(|q| (q.group_number(), q.id));

        let mut items = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            let stats = self.quiz_stats(quiz.id).await?;
            items.push(QuizStatisticsItem {
                quiz_id: quiz.id,
                question: quiz.question,
                total_answers: stats.total_answers,
                correct_answers: stats.correct_answers,
                accuracy_rate: stats.accuracy_rate,
                avg_answer_time_ms: stats.avg_answer_time_ms,
            });
        }

        Ok(items)
    }

    pub async fn leaderboard(
        &self,
        lecture_id: i64,
        limit: LeaderboardLimit,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        let mut per_user = Vec::new();

        if let Some(views) = &self.views {
            match views.lecture_user_stats(lecture_id).await {
                Ok(stats) => per_user = stats,
                Err(err) => log::warn!(
                    "Leaderboard view for lecture {} failed, recomputing from answers: {}",
                    lecture_id,
                    err
                ),
            }
        }

        if per_user.is_empty() {
            let answers = self.answers.find_by_lecture(lecture_id).await?;
            per_user = aggregation::lecture_user_stats(lecture_id, &answers);
        }

        let entries = per_user.into_iter().map(LeaderboardEntry::from).collect();
        Ok(leaderboard::rank(entries, limit))
    }
}
