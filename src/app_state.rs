use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AnswerRepository, FileRepository, MongoAnswerRepository, MongoFileRepository,
        MongoQuizRepository, MongoStatsViewRepository, QuizRepository, StatsViewRepository,
    },
    services::{
        AnswerService, FsTextExtractor, OpenAiModelService, QuizGenerator, QuizService,
        StatisticsService, TextExtractor, TextGenerator,
    },
};

/// Storage and collaborator implementations the services are built from.
pub struct Components {
    pub quizzes: Arc<dyn QuizRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub files: Arc<dyn FileRepository>,
    pub views: Option<Arc<dyn StatsViewRepository>>,
    pub extractor: Arc<dyn TextExtractor>,
    pub model: Arc<dyn TextGenerator>,
}

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub answer_service: Arc<AnswerService>,
    pub statistics_service: Arc<StatisticsService>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let answer_repository = Arc::new(MongoAnswerRepository::new(&db));
        answer_repository.ensure_indexes().await?;

        let views: Option<Arc<dyn StatsViewRepository>> = if config.stats_views_enabled {
            match MongoStatsViewRepository::ensure_views(&db).await {
                Ok(()) => Some(Arc::new(MongoStatsViewRepository::new(&db))),
                Err(e) => {
                    log::warn!("Statistics views unavailable, using raw aggregation: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let components = Components {
            quizzes: quiz_repository,
            answers: answer_repository,
            files: Arc::new(MongoFileRepository::new(&db)),
            views,
            extractor: Arc::new(FsTextExtractor::new(config.upload_root.clone())),
            model: Arc::new(OpenAiModelService::new(&config)),
        };

        Ok(Self::from_components(config, components, Some(db)))
    }

    pub fn from_components(config: Config, components: Components, db: Option<Database>) -> Self {
        let generator = Arc::new(QuizGenerator::new(components.model, &config));

        let statistics_service = Arc::new(StatisticsService::new(
            components.answers.clone(),
            components.quizzes.clone(),
            components.views,
        ));

        let quiz_service = Arc::new(QuizService::new(
            components.quizzes.clone(),
            components.files,
            components.extractor,
            generator,
        ));

        let answer_service = Arc::new(AnswerService::new(
            components.quizzes,
            components.answers,
            statistics_service.clone(),
            config.unresolved_answer_policy,
        ));

        Self {
            quiz_service,
            answer_service,
            statistics_service,
            db,
            config: Arc::new(config),
        }
    }
}
