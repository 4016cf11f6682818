use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{NewQuiz, Quiz},
};

const QUIZ_ID_COUNTER: &str = "quiz_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Quiz>>;
    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Quiz>>;
    async fn list_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Quiz>>;
    async fn list_published(&self, lecture_id: i64) -> AppResult<Vec<Quiz>>;
    async fn group_ids(&self, lecture_id: i64) -> AppResult<Vec<String>>;
    async fn count_group(&self, lecture_id: i64, group_id: &str) -> AppResult<u64>;
    /// Assigns fresh monotonic ids and stores the batch.
    async fn insert_batch(&self, quizzes: Vec<NewQuiz>) -> AppResult<Vec<Quiz>>;
    async fn publish(&self, lecture_id: i64, quiz_ids: &[i64]) -> AppResult<u64>;
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn delete_group(&self, lecture_id: i64, group_id: &str) -> AppResult<u64>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
    counters: Collection<Document>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection("quizzes"),
            counters: db.get_collection("counters"),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
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

        self.collection.create_index(id_index).await?;
        self.collection.create_index(lecture_group_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }

    /// Reserves `count` consecutive ids with a single atomic counter bump; returns the first.
    async fn reserve_ids(&self, count: usize) -> AppResult<i64> {
        let count = count as i64;
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": QUIZ_ID_COUNTER },
                doc! { "$inc": { "seq": count } },
            )
            .with_options(options)
            .await?
            .ok_or_else(|| AppError::InternalError("Quiz id counter missing".to_string()))?;

        let last = counter
            .get_i64("seq")
            .map_err(|e| AppError::InternalError(format!("Invalid quiz id counter: {}", e)))?;

        Ok(last - count + 1)
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Quiz>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let quizzes = self
            .collection
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }

    async fn list_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = self
            .collection
            .find(doc! { "lecture_id": lecture_id })
            .await?
            .try_collect()
            .await?;

        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quizzes)
    }

    async fn list_published(&self, lecture_id: i64) -> AppResult<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = self
            .collection
            .find(doc! { "lecture_id": lecture_id, "published": true })
            .await?
            .try_collect()
            .await?;

        // group ids are strings; order them numerically
        quizzes.sort_by_key(|q| (q.group_number(), q.created_at, q.id));
        Ok(quizzes)
    }

    async fn group_ids(&self, lecture_id: i64) -> AppResult<Vec<String>> {
        let values = self
            .collection
            .distinct("group_id", doc! { "lecture_id": lecture_id })
            .await?;

        Ok(values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    async fn count_group(&self, lecture_id: i64, group_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "lecture_id": lecture_id, "group_id": group_id })
            .await?;
        Ok(count)
    }

    async fn insert_batch(&self, quizzes: Vec<NewQuiz>) -> AppResult<Vec<Quiz>> {
        if quizzes.is_empty() {
            return Ok(Vec::new());
        }

        let first_id = self.reserve_ids(quizzes.len()).await?;
        let quizzes: Vec<Quiz> = quizzes
            .into_iter()
            .enumerate()
            .map(|(offset, new_quiz)| Quiz::from_new(first_id + offset as i64, new_quiz))
            .collect();

        self.collection.insert_many(&quizzes).await?;
        Ok(quizzes)
    }

    async fn publish(&self, lecture_id: i64, quiz_ids: &[i64]) -> AppResult<u64> {
        let result = self
            .collection
            .update_many(
                doc! { "lecture_id": lecture_id, "id": { "$in": quiz_ids.to_vec() } },
                doc! { "$set": { "published": true } },
            )
            .await?;
        Ok(result.matched_count)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!("Quiz with id '{}' not found", id)));
        }

        Ok(())
    }

    async fn delete_group(&self, lecture_id: i64, group_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "lecture_id": lecture_id, "group_id": group_id })
            .await?;
        Ok(result.deleted_count)
    }
}
