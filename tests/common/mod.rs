#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use popquiz_server::{
    app_state::{AppState, Components},
    auth::{JwtService, UserRole},
    config::{Config, UnresolvedAnswerPolicy},
    errors::{AppError, AppResult, GenerationError},
    models::domain::{Answer, AnswerSubmission, NewQuiz, OptionLetter, Quiz, SourceFile},
    repositories::{AnswerRepository, FileRepository, QuizRepository},
    services::{TextExtractor, TextGenerator},
};

pub struct InMemoryQuizRepository {
    quizzes: RwLock<HashMap<i64, Quiz>>,
    next_id: RwLock<i64>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self {
            quizzes: RwLock::new(HashMap::new()),
            next_id: RwLock::new(1),
        }
    }

    pub async fn seed(&self, new_quiz: NewQuiz) -> Quiz {
        self.insert_batch(vec![new_quiz])
            .await
            .expect("seeding an in-memory quiz cannot fail")
            .remove(0)
    }

    pub async fn len(&self) -> usize {
        self.quizzes.read().await.len()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(ids.iter().filter_map(|id| quizzes.get(id).cloned()).collect())
    }

    async fn list_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<Quiz> = quizzes
            .values()
            .filter(|q| q.lecture_id == lecture_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn list_published(&self, lecture_id: i64) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<Quiz> = quizzes
            .values()
            .filter(|q| q.lecture_id == lecture_id && q.published)
            .cloned()
            .collect();
        items.sort_by_key(|q| (q.group_number(), q.created_at, q.id));
        Ok(items)
    }

    async fn group_ids(&self, lecture_id: i64) -> AppResult<Vec<String>> {
        let quizzes = self.quizzes.read().await;
        let groups: HashSet<String> = quizzes
            .values()
            .filter(|q| q.lecture_id == lecture_id)
            .map(|q| q.group_id.clone())
            .collect();
        Ok(groups.into_iter().collect())
    }

    async fn count_group(&self, lecture_id: i64, group_id: &str) -> AppResult<u64> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .filter(|q| q.lecture_id == lecture_id && q.group_id == group_id)
            .count() as u64)
    }

    async fn insert_batch(&self, new_quizzes: Vec<NewQuiz>) -> AppResult<Vec<Quiz>> {
        let mut next_id = self.next_id.write().await;
        let mut quizzes = self.quizzes.write().await;

        let mut saved = Vec::with_capacity(new_quizzes.len());
        for new_quiz in new_quizzes {
            let quiz = Quiz::from_new(*next_id, new_quiz);
            *next_id += 1;
            quizzes.insert(quiz.id, quiz.clone());
            saved.push(quiz);
        }
        Ok(saved)
    }

    async fn publish(&self, lecture_id: i64, quiz_ids: &[i64]) -> AppResult<u64> {
        let mut quizzes = self.quizzes.write().await;
        let mut matched = 0;
        for quiz in quizzes.values_mut() {
            if quiz.lecture_id == lecture_id && quiz_ids.contains(&quiz.id) {
                quiz.published = true;
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut quizzes = self.quizzes.write().await;
        quizzes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))
    }

    async fn delete_group(&self, lecture_id: i64, group_id: &str) -> AppResult<u64> {
        let mut quizzes = self.quizzes.write().await;
        let before = quizzes.len();
        quizzes.retain(|_, q| !(q.lecture_id == lecture_id && q.group_id == group_id));
        Ok((before - quizzes.len()) as u64)
    }
}

/// Upserts happen under one write lock, so concurrent submissions serialize like the unique index does.
pub struct InMemoryAnswerRepository {
    answers: RwLock<HashMap<(i64, i64), Answer>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self {
            answers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.answers.read().await.len()
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<Answer>
    where
        F: Fn(&Answer) -> bool,
    {
        let answers = self.answers.read().await;
        let mut items: Vec<Answer> = answers.values().filter(|a| predicate(a)).cloned().collect();
        items.sort_by_key(|a| (a.answered_at, a.quiz_id, a.user_id));
        items
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn upsert(&self, submission: AnswerSubmission) -> AppResult<Answer> {
        let now = Utc::now();
        let mut answers = self.answers.write().await;
        let key = (submission.quiz_id, submission.user_id);

        let answer = match answers.get_mut(&key) {
            Some(existing) => {
                existing.apply_resubmission(submission, now);
                existing.clone()
            }
            None => {
                let answer = submission.into_first_answer(now);
                answers.insert(key, answer.clone());
                answer
            }
        };
        Ok(answer)
    }

    async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Answer>> {
        Ok(self.filtered(|a| a.quiz_id == quiz_id).await)
    }

    async fn find_by_lecture(&self, lecture_id: i64) -> AppResult<Vec<Answer>> {
        Ok(self.filtered(|a| a.lecture_id == lecture_id).await)
    }

    async fn find_by_lecture_and_user(
        &self,
        lecture_id: i64,
        user_id: i64,
    ) -> AppResult<Vec<Answer>> {
        Ok(self
            .filtered(|a| a.lecture_id == lecture_id && a.user_id == user_id)
            .await)
    }

    async fn find_by_group(&self, lecture_id: i64, group_id: &str) -> AppResult<Vec<Answer>> {
        Ok(self
            .filtered(|a| a.lecture_id == lecture_id && a.group_id == group_id)
            .await)
    }
}

pub struct InMemoryFileRepository {
    files: HashMap<i64, SourceFile>,
}

impl InMemoryFileRepository {
    pub fn with_files(files: Vec<SourceFile>) -> Self {
        Self {
            files: files.into_iter().map(|f| (f.id, f)).collect(),
        }
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<SourceFile>> {
        Ok(self.files.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<SourceFile>> {
        Ok(ids.iter().filter_map(|id| self.files.get(id).cloned()).collect())
    }
}

/// Extractor backed by a fixed map of file id to text.
pub struct FixedTextExtractor {
    texts: HashMap<i64, String>,
}

impl FixedTextExtractor {
    pub fn new(texts: Vec<(i64, &str)>) -> Self {
        Self {
            texts: texts
                .into_iter()
                .map(|(id, text)| (id, text.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl TextExtractor for FixedTextExtractor {
    async fn extract_text(&self, file: &SourceFile) -> AppResult<String> {
        Ok(self.texts.get(&file.id).cloned().unwrap_or_default())
    }
}

/// Replays queued model replies, then falls back to a valid five-question batch.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    pub fn with_replies(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(valid_batch(5)))
    }
}

pub fn valid_batch(count: usize) -> String {
    let items: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "question": format!("Generated question {}?", i + 1),
                "option_a": "Alpha",
                "option_b": "Beta",
                "option_c": "Gamma",
                "option_d": "Delta",
                "correct_option": "B",
            })
        })
        .collect();
    serde_json::to_string(&items).unwrap()
}

pub fn source_file(id: i64, lecture_id: i64) -> SourceFile {
    SourceFile {
        id,
        lecture_id,
        filename: format!("notes-{}.txt", id),
        filepath: format!("lectures/{}/notes-{}.txt", lecture_id, id),
        file_type: Some("text/plain".to_string()),
    }
}

pub fn new_quiz(lecture_id: i64, group_id: &str, correct: OptionLetter) -> NewQuiz {
    NewQuiz {
        lecture_id,
        question: "What is the capital of France?".to_string(),
        options: [
            "London".to_string(),
            "Paris".to_string(),
            "Berlin".to_string(),
            "Madrid".to_string(),
        ],
        correct_option: correct,
        group_id: group_id.to_string(),
        source_file_ids: vec![],
    }
}

pub fn test_config() -> Config {
    let mut config = Config::from_env();
    config.app_env = "test".to_string();
    config.quiz_batch_size = 5;
    config.generation_max_attempts = 4;
    config.generation_retry_delay_ms = 0;
    config.generation_timeout_secs = 5;
    config.stats_views_enabled = false;
    config.unresolved_answer_policy = UnresolvedAnswerPolicy::Reject;
    config
}

/// Everything a test needs to drive the services and inspect storage afterwards.
pub struct Harness {
    pub state: AppState,
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub answers: Arc<InMemoryAnswerRepository>,
    pub model: Arc<ScriptedModel>,
    pub jwt: JwtService,
}

impl Harness {
    pub fn token(&self, user_id: i64, role: UserRole) -> String {
        self.jwt
            .create_token(user_id, role, 1)
            .expect("token creation should succeed")
    }
}

pub struct HarnessBuilder {
    config: Config,
    files: Vec<SourceFile>,
    texts: Vec<(i64, &'static str)>,
    model: ScriptedModel,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            files: Vec::new(),
            texts: Vec::new(),
            model: ScriptedModel::new(),
        }
    }

    pub fn file(mut self, file: SourceFile, text: &'static str) -> Self {
        self.texts.push((file.id, text));
        self.files.push(file);
        self
    }

    pub fn model(mut self, model: ScriptedModel) -> Self {
        self.model = model;
        self
    }

    pub fn policy(mut self, policy: UnresolvedAnswerPolicy) -> Self {
        self.config.unresolved_answer_policy = policy;
        self
    }

    pub fn build(self) -> Harness {
        let quizzes = Arc::new(InMemoryQuizRepository::new());
        let answers = Arc::new(InMemoryAnswerRepository::new());
        let model = Arc::new(self.model);
        let jwt = JwtService::new(&self.config.jwt_secret);

        let components = Components {
            quizzes: quizzes.clone(),
            answers: answers.clone(),
            files: Arc::new(InMemoryFileRepository::with_files(self.files)),
            views: None,
            extractor: Arc::new(FixedTextExtractor::new(self.texts)),
            model: model.clone(),
        };

        Harness {
            state: AppState::from_components(self.config, components, None),
            quizzes,
            answers,
            model,
            jwt,
        }
    }
}
