pub mod answer;
pub mod quiz;
pub mod source_file;
pub mod stats;
pub use answer::{Answer, AnswerSubmission};
pub use quiz::{NewQuiz, OptionLetter, Quiz};
pub use source_file::SourceFile;
pub use stats::{GroupStats, LeaderboardEntry, LectureStats, QuizStats, UserLectureStats};
