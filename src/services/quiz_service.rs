use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            quiz::{group_number, next_group_number},
            Quiz,
        },
        dto::{
            quiz_dto::{GeneratedQuizItem, PublishedQuizDto},
            request::{
                GenerateQuizRequest, PublishQuizzesRequest, RegenerateQuizRequest, SourceSelection,
            },
            response::{GenerateQuizResponse, GroupIdsResponse, MessageResponse},
        },
    },
    repositories::{FileRepository, QuizRepository},
    services::{generation::QuizGenerator, text_extraction::TextExtractor},
};

/// Text gathered for one generation call and the files it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceText {
    pub text: String,
    pub file_ids: Vec<i64>,
}

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    files: Arc<dyn FileRepository>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<QuizGenerator>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        files: Arc<dyn FileRepository>,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<QuizGenerator>,
    ) -> Self {
        Self {
            quizzes,
            files,
            extractor,
            generator,
        }
    }

    pub async fn collect_source_text(&self, selection: &SourceSelection) -> AppResult<SourceText> {
        let mut ids = selection.file_ids.clone();
        if let Some(media_id) = selection.media_id {
            if !ids.contains(&media_id) {
                ids.push(media_id);
            }
        }

        let files = self.files.find_by_ids(&ids).await?;
        if files.len() < ids.len() {
            log::warn!(
                "{} of {} selected files were not found",
                ids.len() - files.len(),
                ids.len()
            );
        }

        let mut texts = Vec::new();
        let mut file_ids = Vec::new();
        for file in &files {
            let text = self.extractor.extract_text(file).await?;
            if text.trim().is_empty() {
                continue;
            }
            texts.push(text);
            file_ids.push(file.id);
        }

        if texts.is_empty() {
            return Err(AppError::ValidationError(
                "No text could be extracted from the selected files".to_string(),
            ));
        }

        Ok(SourceText {
            text: texts.join("\n"),
            file_ids,
        })
    }

    async fn generate_items(
        &self,
        selection: &SourceSelection,
    ) -> AppResult<(Vec<GeneratedQuizItem>, SourceText)> {
        if selection.is_empty() {
            return Err(AppError::ValidationError(
                "At least one of file_ids or media_id is required".to_string(),
            ));
        }

        let source = self.collect_source_text(selection).await?;
        let items = self.generator.generate(&source.text).await?;
        Ok((items, source))
    }

    async fn store_group(
        &self,
        lecture_id: i64,
        group_id: String,
        items: Vec<GeneratedQuizItem>,
        source: &SourceText,
    ) -> AppResult<GenerateQuizResponse> {
        let new_quizzes = items
            .iter()
            .cloned()
            .map(|item| item.into_new_quiz(lecture_id, &group_id, &source.file_ids))
            .collect();
        let saved = self.quizzes.insert_batch(new_quizzes).await?;

        log::info!(
            "Stored {} quizzes in group {} of lecture {}",
            saved.len(),
            group_id,
            lecture_id
        );

        Ok(GenerateQuizResponse {
            message: "Quizzes generated".to_string(),
            quiz_ids: saved.iter().map(|q| q.id).collect(),
            info: format!(
                "Generated {} questions from {} source file(s)",
                saved.len(),
                source.file_ids.len()
            ),
            group_id,
            data: items,
        })
    }

    pub async fn generate(
        &self,
        lecture_id: i64,
        request: &GenerateQuizRequest,
    ) -> AppResult<GenerateQuizResponse> {
        let (items, source) = self.generate_items(request).await?;

        let existing = self.quizzes.group_ids(lecture_id).await?;
        let group_id = next_group_number(&existing).to_string();

        self.store_group(lecture_id, group_id, items, &source).await
    }

    /// Replaces a group: the new batch is generated before the old group is deleted.
    pub async fn regenerate(
        &self,
        lecture_id: i64,
        request: &RegenerateQuizRequest,
    ) -> AppResult<GenerateQuizResponse> {
        request.validate()?;

        let existing_count = self
            .quizzes
            .count_group(lecture_id, &request.group_id)
            .await?;
        if existing_count == 0 {
            return Err(AppError::NotFound(format!(
                "Quiz group '{}' not found in lecture {}",
                request.group_id, lecture_id
            )));
        }

        let (items, source) = self.generate_items(&request.sources).await?;

        let existing = self.quizzes.group_ids(lecture_id).await?;
        let group_id = next_group_number(&existing).to_string();

        let response = self.store_group(lecture_id, group_id, items, &source).await?;

        let deleted = self
            .quizzes
            .delete_group(lecture_id, &request.group_id)
            .await?;
        log::info!(
            "Replaced {} quizzes of group {} in lecture {} with group {}",
            deleted,
            request.group_id,
            lecture_id,
            response.group_id
        );

        Ok(response)
    }

    pub async fn publish(
        &self,
        lecture_id: i64,
        request: &PublishQuizzesRequest,
    ) -> AppResult<MessageResponse> {
        request.validate()?;

        let published = self.quizzes.publish(lecture_id, &request.quiz_ids).await?;
        if published == 0 {
            return Err(AppError::NotFound(format!(
                "No quizzes of lecture {} matched the given ids",
                lecture_id
            )));
        }

        log::info!("Published {} quizzes in lecture {}", published, lecture_id);
        Ok(MessageResponse {
            message: format!("Published {} quizzes", published),
        })
    }

    pub async fn list_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Quiz>> {
        self.quizzes.list_by_lecture(lecture_id).await
    }

    pub async fn list_published(
        &self,
        lecture_id: i64,
        reveal_answers: bool,
    ) -> AppResult<Vec<PublishedQuizDto>> {
        let quizzes = self.quizzes.list_published(lecture_id).await?;
        Ok(quizzes
            .into_iter()
            .map(|quiz| PublishedQuizDto::from_quiz(quiz, reveal_answers))
            .collect())
    }

    pub async fn group_ids(&self, lecture_id: i64) -> AppResult<GroupIdsResponse> {
        let mut groups = self.quizzes.group_ids(lecture_id).await?;
        groups.sort_by_key(|g| (group_number(g).unwrap_or(u64::MAX), g.clone()));

        Ok(GroupIdsResponse {
            success: true,
            count: groups.len(),
            data: groups,
        })
    }

    pub async fn delete(&self, quiz_id: i64) -> AppResult<()> {
        self.quizzes.delete(quiz_id).await?;
        log::info!("Deleted quiz {}", quiz_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        errors::GenerationError,
        models::domain::{NewQuiz, SourceFile},
        repositories::{file_repository::MockFileRepository, quiz_repository::MockQuizRepository},
        services::{model_service::MockTextGenerator, text_extraction::MockTextExtractor},
    };
    use mockall::Sequence;
    use serde_json::json;

    fn source_file(id: i64) -> SourceFile {
        SourceFile {
            id,
            lecture_id: 100,
            filename: format!("f{}.txt", id),
            filepath: format!("f{}.txt", id),
            file_type: Some("text/plain".to_string()),
        }
    }

    fn model_output() -> String {
        let items: Vec<_> = (0..5)
            .map(|i| {
                json!({
                    "question": format!("Q{}?", i),
                    "option_a": "a",
                    "option_b": "b",
                    "option_c": "c",
                    "option_d": "d",
                    "correct_option": "C",
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    fn files_returning_all() -> MockFileRepository {
        let mut files = MockFileRepository::new();
        files
            .expect_find_by_ids()
            .returning(|ids| Ok(ids.iter().map(|id| source_file(*id)).collect()));
        files
    }

    fn model_returning_batch() -> MockTextGenerator {
        let mut model = MockTextGenerator::new();
        model.expect_generate().returning(|_, _| Ok(model_output()));
        model
    }

    fn service(
        quizzes: MockQuizRepository,
        files: MockFileRepository,
        extractor: MockTextExtractor,
        model: MockTextGenerator,
    ) -> QuizService {
        let generator = QuizGenerator::new(Arc::new(model), &Config::test_config());
        QuizService::new(
            Arc::new(quizzes),
            Arc::new(files),
            Arc::new(extractor),
            Arc::new(generator),
        )
    }

    fn stored(new_quizzes: Vec<NewQuiz>) -> Vec<Quiz> {
        new_quizzes
            .into_iter()
            .enumerate()
            .map(|(i, q)| Quiz::from_new(50 + i as i64, q))
            .collect()
    }

    #[tokio::test]
    async fn source_text_joins_files_and_media() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract_text()
            .returning(|file| Ok(format!("text of {}", file.id)));

        let source = service(
            MockQuizRepository::new(),
            files_returning_all(),
            extractor,
            MockTextGenerator::new(),
        )
        .collect_source_text(&SourceSelection {
            file_ids: vec![1, 2],
            media_id: Some(9),
        })
        .await
        .unwrap();

        assert_eq!(source.text, "text of 1\ntext of 2\ntext of 9");
        assert_eq!(source.file_ids, vec![1, 2, 9]);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_write() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract_text()
            .returning(|_| Ok("   \n".to_string()));

        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_insert_batch().times(0);

        let mut model = MockTextGenerator::new();
        model.expect_generate().times(0);

        let err = service(quizzes, files_returning_all(), extractor, model)
            .generate(
                100,
                &SourceSelection {
                    file_ids: vec![1],
                    media_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn generate_uses_next_group_number() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract_text()
            .returning(|_| Ok("lecture".to_string()));

        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_group_ids()
            .returning(|_| Ok(vec!["1".into(), "2".into(), "4".into()]));
        quizzes
            .expect_insert_batch()
            .withf(|batch| batch.len() == 5 && batch.iter().all(|q| q.group_id == "5"))
            .times(1)
            .returning(|batch| Ok(stored(batch)));

        let response = service(quizzes, files_returning_all(), extractor, model_returning_batch())
            .generate(
                100,
                &SourceSelection {
                    file_ids: vec![3],
                    media_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.group_id, "5");
        assert_eq!(response.quiz_ids, vec![50, 51, 52, 53, 54]);
    }

    #[tokio::test]
    async fn failed_regeneration_keeps_the_old_group() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract_text()
            .returning(|_| Ok("lecture".to_string()));

        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_count_group().returning(|_, _| Ok(5));
        quizzes.expect_delete_group().times(0);
        quizzes.expect_insert_batch().times(0);

        let mut model = MockTextGenerator::new();
        model
            .expect_generate()
            .returning(|_, _| Err(GenerationError::Upstream("connection refused".into())));

        let err = service(quizzes, files_returning_all(), extractor, model)
            .regenerate(
                100,
                &RegenerateQuizRequest {
                    group_id: "2".to_string(),
                    sources: SourceSelection {
                        file_ids: vec![1],
                        media_id: None,
                    },
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(GenerationError::Upstream(_))));
    }

    fn regenerate_group_two() -> RegenerateQuizRequest {
        RegenerateQuizRequest {
            group_id: "2".to_string(),
            sources: SourceSelection {
                file_ids: vec![1],
                media_id: None,
            },
        }
    }

    #[tokio::test]
    async fn regeneration_stores_the_new_group_before_dropping_the_old() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract_text()
            .returning(|_| Ok("lecture".to_string()));

        let mut seq = Sequence::new();
        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_count_group().returning(|_, _| Ok(5));
        quizzes
            .expect_group_ids()
            .returning(|_| Ok(vec!["1".into(), "2".into()]));
        quizzes
            .expect_insert_batch()
            .withf(|batch| batch.iter().all(|q| q.group_id == "3"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|batch| Ok(stored(batch)));
        quizzes
            .expect_delete_group()
            .withf(|lecture, group| *lecture == 100 && group == "2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(5));

        let response = service(quizzes, files_returning_all(), extractor, model_returning_batch())
            .regenerate(100, &regenerate_group_two())
            .await
            .unwrap();

        assert_eq!(response.group_id, "3");
        assert_eq!(response.quiz_ids.len(), 5);
    }

    #[tokio::test]
    async fn failed_insert_during_regeneration_keeps_the_old_group() {
        let mut extractor = MockTextExtractor::new();
        extractor
            .expect_extract_text()
            .returning(|_| Ok("lecture".to_string()));

        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_count_group().returning(|_, _| Ok(5));
        quizzes
            .expect_group_ids()
            .returning(|_| Ok(vec!["1".into(), "2".into()]));
        quizzes
            .expect_insert_batch()
            .times(1)
            .returning(|_| Err(AppError::DatabaseError("write concern timeout".into())));
        quizzes.expect_delete_group().times(0);

        let err = service(quizzes, files_returning_all(), extractor, model_returning_batch())
            .regenerate(100, &regenerate_group_two())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn regenerating_a_missing_group_is_not_found() {
        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_count_group().returning(|_, _| Ok(0));

        let err = service(
            quizzes,
            MockFileRepository::new(),
            MockTextExtractor::new(),
            MockTextGenerator::new(),
        )
        .regenerate(
            100,
            &RegenerateQuizRequest {
                group_id: "9".to_string(),
                sources: SourceSelection {
                    file_ids: vec![1],
                    media_id: None,
                },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn group_ids_are_sorted_numerically() {
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_group_ids()
            .returning(|_| Ok(vec!["10".into(), "9".into(), "1".into()]));

        let response = service(
            quizzes,
            MockFileRepository::new(),
            MockTextExtractor::new(),
            MockTextGenerator::new(),
        )
        .group_ids(100)
        .await
        .unwrap();

        assert_eq!(response.data, vec!["1", "9", "10"]);
        assert_eq!(response.count, 3);
    }
}
