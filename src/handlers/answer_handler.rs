use actix_web::{get, post, routes, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_self_or_speaker, require_speaker, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{LeaderboardQuery, SubmitAnswerRequest},
        response::{ApiResponse, LeaderboardResponse},
    },
    services::leaderboard::LeaderboardLimit,
};

#[routes]
#[post("/quiz/{quiz_id}/answer")]
#[post("/answers/{quiz_id}/answer")]
pub async fn submit_answer(
    state: web::Data<AppState>,
    quiz_id: web::Path<i64>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user_id = auth.user_id()?;

    let response = state
        .answer_service
        .submit_answer(quiz_id.into_inner(), user_id, &request)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/answers/submit")]
pub async fn submit_answer_with_body_id(
    state: web::Data<AppState>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user_id = auth.user_id()?;
    let quiz_id = request
        .quiz_id
        .ok_or_else(|| AppError::ValidationError("quiz_id is required".to_string()))?;

    let response = state
        .answer_service
        .submit_answer(quiz_id, user_id, &request)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[routes]
#[get("/answers/lecture/{lecture_id}/my-answers")]
#[get("/quiz/lecture/{lecture_id}/my-answers")]
pub async fn my_answers(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user_id = auth.user_id()?;

    let response = state
        .answer_service
        .my_answers(lecture_id.into_inner(), user_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/answers/lecture/{lecture_id}/user/{user_id}/answers")]
pub async fn user_answers(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (lecture_id, user_id) = path.into_inner();
    require_self_or_speaker(auth.claims(), user_id)?;

    let answers = state
        .answer_service
        .user_answers(lecture_id, user_id)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(answers)))
}

#[get("/answers/lecture/{lecture_id}/leaderboard")]
pub async fn leaderboard(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    query: web::Query<LeaderboardQuery>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let limit = LeaderboardLimit::from_query(query.limit.as_deref());

    let entries = state
        .statistics_service
        .leaderboard(lecture_id.into_inner(), limit)
        .await?;
    let response: LeaderboardResponse = ApiResponse::ok(entries);
    Ok(HttpResponse::Ok().json(response))
}

#[get("/answers/lecture/{lecture_id}/stats")]
pub async fn lecture_stats(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .statistics_service
        .lecture_overview(lecture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/answers/lecture/{lecture_id}/quiz-stats")]
pub async fn lecture_quiz_stats(
    state: web::Data<AppState>,
    lecture_id: web::Path<i64>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_speaker(auth.claims())?;

    let items = state
        .statistics_service
        .lecture_quiz_statistics(lecture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}
