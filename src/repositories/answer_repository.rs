use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, to_document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{Answer, AnswerSubmission},
};

pub const ANSWERS_COLLECTION: &str = "quiz_answers";

const DUPLICATE_KEY: i32 = 11000;
const MAX_UPSERT_ATTEMPTS: u32 = 3;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Atomic insert-or-update keyed by (quiz_id, user_id).
    async fn upsert(&self, submission: AnswerSubmission) -> AppResult<Answer>;
    async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Answer>>;
    async fn find_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Answer>>;
    async fn find_by_lecture_and_user(&self, lecture_id: i64, user_id: i64)
        -> AppResult<Vec<Answer>>;
    async fn find_by_group(&self, lecture_id: i64, group_id: &str) -> AppResult<Vec<Answer>>;
}

pub struct MongoAnswerRepository {
    collection: Collection<Answer>,
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        _ => false,
    }
}

impl MongoAnswerRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(ANSWERS_COLLECTION);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for {} collection", ANSWERS_COLLECTION);

        let quiz_user_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("quiz_user_unique".to_string())
                    .build(),
            )
            .build();

        let lecture_user_index = IndexModel::builder()
            .keys(doc! { "lecture_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("lecture_user".to_string())
                    .build(),
            )
            .build();

        let lecture_group_index = IndexModel::builder()
            .keys(doc! { "lecture_id": 1, "group_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("lecture_group".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(quiz_user_index).await?;
        self.collection.create_index(lecture_user_index).await?;
        self.collection.create_index(lecture_group_index).await?;

        log::info!("Successfully created indexes for {} collection", ANSWERS_COLLECTION);
        Ok(())
    }

    async fn find_many(&self, filter: mongodb::bson::Document) -> AppResult<Vec<Answer>> {
        let answers = self.collection.find(filter).await?.try_collect().await?;
        Ok(answers)
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn upsert(&self, submission: AnswerSubmission) -> AppResult<Answer> {
        let filter = doc! { "quiz_id": submission.quiz_id, "user_id": submission.user_id };
        let now = Utc::now();

        let mut set = to_document(&submission)?;
        set.remove("quiz_id");
        set.remove("user_id");
        set.insert("updated_at", to_bson(&now)?);

        let update = doc! {
            "$set": set,
            "$setOnInsert": { "answered_at": to_bson(&now)? },
            "$inc": { "submit_count": 1 },
        };

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let mut attempt = 1;
        loop {
            let result = self
                .collection
                .find_one_and_update(filter.clone(), update.clone())
                .with_options(options.clone())
                .await;

            match result {
                Ok(Some(answer)) => return Ok(answer),
                Ok(None) => {
                    return Err(AppError::InternalError(
                        "Upsert returned no answer document".to_string(),
                    ))
                }
                // Two racing first submissions: the loser retries and lands on the update path
                Err(err) if is_duplicate_key(&err) && attempt < MAX_UPSERT_ATTEMPTS => {
                    log::warn!(
                        "Concurrent answer upsert for quiz {} user {}, retrying (attempt {})",
                        submission.quiz_id,
                        submission.user_id,
                        attempt
                    );
                    attempt += 1;
                }
                Err(err) if is_duplicate_key(&err) => {
                    return Err(AppError::Conflict(format!(
                        "Answer for quiz {} by user {} is being updated concurrently",
                        submission.quiz_id, submission.user_id
                    )))
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Answer>> {
        self.find_many(doc! { "quiz_id": quiz_id }).await
    }

    async fn find_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Answer>> {
        self.find_many(doc! { "lecture_id": lecture_id }).await
    }

    async fn find_by_lecture_and_user(
        &self,
        lecture_id: i64,
        user_id: i64,
    ) -> AppResult<Vec<Answer>> {
        let mut answers = self
            .find_many(doc! { "lecture_id": lecture_id, "user_id": user_id })
            .await?;
        answers.sort_by_key(|a| (a.answered_at, a.quiz_id));
        Ok(answers)
    }

    async fn find_by_group(&self, lecture_id: i64, group_id: &str) -> AppResult<Vec<Answer>> {
        self.find_many(doc! { "lecture_id": lecture_id, "group_id": group_id })
            .await
    }
}
