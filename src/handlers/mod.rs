pub mod answer_handler;
pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

use crate::{auth::AuthMiddleware, errors::AppError};

pub use health_handler::{health_check, health_check_live, health_check_ready};

/// Malformed bodies, queries and path ids answer 400 with the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(health_check)
        .service(health_check_live)
        .service(health_check_ready)
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(quiz_handler::generate_quizzes)
                .service(quiz_handler::regenerate_quizzes)
                .service(quiz_handler::publish_quizzes)
                .service(quiz_handler::list_quiz_groups)
                .service(quiz_handler::list_lecture_quizzes)
                .service(quiz_handler::delete_quiz)
                .service(quiz_handler::list_published_quizzes)
                .service(answer_handler::submit_answer)
                .service(answer_handler::submit_answer_with_body_id)
                .service(answer_handler::my_answers)
                .service(answer_handler::user_answers)
                .service(answer_handler::leaderboard)
                .service(answer_handler::lecture_stats)
                .service(answer_handler::lecture_quiz_stats),
        );
}
