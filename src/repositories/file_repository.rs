use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection};

use crate::{db::Database, errors::AppResult, models::domain::SourceFile};

/// Read access to file metadata written by the upload service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<SourceFile>>;
    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<SourceFile>>;
}

pub struct MongoFileRepository {
    collection: Collection<SourceFile>,
}

impl MongoFileRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("files");
        Self { collection }
    }
}

#[async_trait]
impl FileRepository for MongoFileRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<SourceFile>> {
        let file = self.collection.find_one(doc! { "id": id }).await?;
        Ok(file)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<SourceFile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut files: Vec<SourceFile> = self
            .collection
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;

        // keep the order the caller asked for
        files.sort_by_key(|f| ids.iter().position(|id| *id == f.id));
        Ok(files)
    }
}
