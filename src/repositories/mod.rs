pub mod answer_repository;
pub mod file_repository;
pub mod quiz_repository;
pub mod stats_view_repository;

pub use answer_repository::{AnswerRepository, MongoAnswerRepository};
pub use file_repository::{FileRepository, MongoFileRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use stats_view_repository::{MongoStatsViewRepository, StatsViewRepository};
