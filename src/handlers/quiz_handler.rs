use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{is_speaker, require_speaker, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{GenerateQuizRequest, PublishQuizzesRequest, RegenerateQuizRequest},
        response::{ApiResponse, MessageResponse},
    },
};

#[post("/quizzes/generate/{lecture_id}")]
pub async fn generate_quizzes(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    request: web::Json<GenerateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_speaker(auth.claims())?;

    let response = state
        .quiz_service
        .generate(lecture_id.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/quizzes/{lecture_id}/quizzes/regenerate")]
pub async fn regenerate_quizzes(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    request: web::Json<RegenerateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_speaker(auth.claims())?;

    let response = state
        .quiz_service
        .regenerate(lecture_id.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/quizzes/publish/{lecture_id}")]
pub async fn publish_quizzes(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    request: web::Json<PublishQuizzesRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_speaker(auth.claims())?;

    let response = state
        .quiz_service
        .publish(lecture_id.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/quizzes/{lecture_id}")]
pub async fn list_lecture_quizzes(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_speaker(auth.claims())?;

    let quizzes = state
        .quiz_service
        .list_by_lecture(lecture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(quizzes)))
}

#[get("/quizzes/{lecture_id}/groups")]
pub async fn list_quiz_groups(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state.quiz_service.group_ids(lecture_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[delete("/quizzes/{quiz_id}")]
pub async fn delete_quiz(
    state: web::Data<AppState>,
    quiz_id: web::Path<i64>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_speaker(auth.claims())?;

    let quiz_id = quiz_id.into_inner();
    state.quiz_service.delete(quiz_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("Quiz {} deleted", quiz_id),
    }))
}

#[get("/quiz/lecture/{lecture_id}/published")]
pub async fn list_published_quizzes(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state
        .quiz_service
        .list_published(lecture_id.into_inner(), is_speaker(auth.claims()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(quizzes)))
}
