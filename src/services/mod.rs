pub mod aggregation;
pub mod answer_service;
pub mod generation;
pub mod leaderboard;
pub mod model_service;
pub mod quiz_service;
pub mod statistics_service;
pub mod text_extraction;

pub use answer_service::AnswerService;
pub use generation::QuizGenerator;
pub use model_service::{OpenAiModelService, TextGenerator};
pub use quiz_service::QuizService;
pub use statistics_service::StatisticsService;
pub use text_extraction::{FsTextExtractor, TextExtractor};
