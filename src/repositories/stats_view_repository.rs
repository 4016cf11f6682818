use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    Collection,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{LectureStats, QuizStats, UserLectureStats},
    repositories::answer_repository::ANSWERS_COLLECTION,
};

pub const QUIZ_STATS_VIEW: &str = "quiz_answer_stats";
pub const USER_STATS_VIEW: &str = "user_quiz_stats";
pub const LECTURE_STATS_VIEW: &str = "lecture_quiz_stats";

/// Precomputed aggregates. Callers treat errors and empty results as "view unavailable".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsViewRepository: Send + Sync {
    async fn quiz_stats(&self, quiz_id: i64) -> AppResult<Option<QuizStats>>;
    async fn user_stats(&self, lecture_id: i64, user_id: i64) -> AppResult<Option<UserLectureStats>>;
    async fn lecture_user_stats(&self, lecture_id: i64) -> AppResult<Vec<UserLectureStats>>;
    async fn lecture_stats(&self, lecture_id: i64) -> AppResult<Option<LectureStats>>;
}

fn correct_sum() -> Document {
    doc! { "$sum": { "$cond": ["$is_correct", 1, 0] } }
}

/// Percentage rounded half away from zero, like `aggregation::accuracy_rate`.
/// `$round` rounds half to even, so the rounding is spelled out with `$floor`.
fn rate(correct: &str, total: &str, places: i32) -> Document {
    let factor = 10f64.powi(places);
    let scaled = doc! {
        "$multiply": [{ "$multiply": [{ "$divide": [correct, total] }, 100] }, factor]
    };
    doc! {
        "$cond": [
            { "$gt": [total, 0] },
            { "$divide": [{ "$floor": { "$add": [scaled, 0.5] } }, factor] },
            0.0
        ]
    }
}

fn quiz_stats_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": {
            "_id": "$quiz_id",
            "total_answers": { "$sum": 1 },
            "correct_answers": correct_sum(),
            "avg_answer_time_ms": { "$avg": "$answer_time_ms" },
        }},
        doc! { "$project": {
            "_id": 0,
            "quiz_id": "$_id",
            "total_answers": 1,
            "correct_answers": 1,
            "avg_answer_time_ms": 1,
            "accuracy_rate": rate("$correct_answers", "$total_answers", 2),
        }},
    ]
}

fn user_stats_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": {
            "_id": { "lecture_id": "$lecture_id", "user_id": "$user_id" },
            "total_questions": { "$sum": 1 },
            "correct_answers": correct_sum(),
            "groups": { "$addToSet": "$group_id" },
            "avg_answer_time_ms": { "$avg": "$answer_time_ms" },
        }},
        doc! { "$project": {
            "_id": 0,
            "lecture_id": "$_id.lecture_id",
            "user_id": "$_id.user_id",
            "total_questions": 1,
            "correct_answers": 1,
            "groups_participated": { "$size": "$groups" },
            "avg_answer_time_ms": 1,
            "accuracy_rate": rate("$correct_answers", "$total_questions", 1),
        }},
    ]
}

fn lecture_stats_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": {
            "_id": "$lecture_id",
            "participants": { "$addToSet": "$user_id" },
            "questions": { "$addToSet": "$quiz_id" },
            "groups": { "$addToSet": "$group_id" },
            "total_answers": { "$sum": 1 },
            "correct_answers": correct_sum(),
            "avg_answer_time_ms": { "$avg": "$answer_time_ms" },
        }},
        doc! { "$project": {
            "_id": 0,
            "lecture_id": "$_id",
            "participants_count": { "$size": "$participants" },
            "questions_count": { "$size": "$questions" },
            "groups_count": { "$size": "$groups" },
            "total_answers": 1,
            "correct_answers": 1,
            "avg_answer_time_ms": 1,
            "overall_accuracy_rate": rate("$correct_answers", "$total_answers", 2),
        }},
    ]
}

pub struct MongoStatsViewRepository {
    quiz_stats: Collection<QuizStats>,
    user_stats: Collection<UserLectureStats>,
    lecture_stats: Collection<LectureStats>,
}

impl MongoStatsViewRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            quiz_stats: db.get_collection(QUIZ_STATS_VIEW),
            user_stats: db.get_collection(USER_STATS_VIEW),
            lecture_stats: db.get_collection(LECTURE_STATS_VIEW),
        }
    }

    /// Creates the read-only views over the answers collection when missing.
    pub async fn ensure_views(db: &Database) -> AppResult<()> {
        let database = db.database();
        let existing = database.list_collection_names().await?;

        let views = [
            (QUIZ_STATS_VIEW, quiz_stats_pipeline()),
            (USER_STATS_VIEW, user_stats_pipeline()),
            (LECTURE_STATS_VIEW, lecture_stats_pipeline()),
        ];

        for (name, pipeline) in views {
            if existing.iter().any(|c| c == name) {
                continue;
            }
            database
                .run_command(doc! {
                    "create": name,
                    "viewOn": ANSWERS_COLLECTION,
                    "pipeline": pipeline,
                })
                .await?;
            log::info!("Created statistics view '{}'", name);
        }

        Ok(())
    }
}

#[async_trait]
impl StatsViewRepository for MongoStatsViewRepository {
    async fn quiz_stats(&self, quiz_id: i64) -> AppResult<Option<QuizStats>> {
        let stats = self.quiz_stats.find_one(doc! { "quiz_id": quiz_id }).await?;
        Ok(stats)
    }

    async fn user_stats(&self, lecture_id: i64, user_id: i64) -> AppResult<Option<UserLectureStats>> {
        let stats = self
            .user_stats
            .find_one(doc! { "lecture_id": lecture_id, "user_id": user_id })
            .await?;
        Ok(stats)
    }

    async fn lecture_user_stats(&self, lecture_id: i64) -> AppResult<Vec<UserLectureStats>> {
        let stats = self
            .user_stats
            .find(doc! { "lecture_id": lecture_id })
            .await?
            .try_collect()
            .await?;
        Ok(stats)
    }

    async fn lecture_stats(&self, lecture_id: i64) -> AppResult<Option<LectureStats>> {
        let stats = self
            .lecture_stats
            .find_one(doc! { "lecture_id": lecture_id })
            .await?;
        Ok(stats)
    }
}
