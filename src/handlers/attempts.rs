// src/handlers/attempts.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, Uri},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    attempts::{AbandonOutcome, AttemptManager},
    config::Config,
    error::AppError,
    models::{
        attempt::{QuizAttemptRequest, SubmitAttemptRequest},
        user::Role,
    },
    utils::jwt::{Claims, request_token, verify_jwt},
};

const QUIZ_TAKERS: &[Role] = &[Role::Student, Role::Seller];
const QUIZ_TAKERS_ONLY: &str = "Students and Sellers only";

fn required_quiz_id(quiz_id: Option<String>) -> Result<String, AppError> {
    quiz_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::BadRequest("Quiz ID required".to_string()))
}

/// Accepts a JSON number or a numeric string.
fn parse_score(raw: &serde_json::Value) -> Option<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Attempt history of the caller, keyed by quiz id.
pub async fn list_my_attempts(
    State(attempts): State<Arc<AttemptManager>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(QUIZ_TAKERS, QUIZ_TAKERS_ONLY)?;

    let mine = attempts.list_attempts(claims.identity()).await?;
    Ok(Json(mine))
}

/// Opens a timed attempt as soon as the quiz page loads.
pub async fn start_attempt(
    State(attempts): State<Arc<AttemptManager>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<QuizAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(QUIZ_TAKERS, QUIZ_TAKERS_ONLY)?;
    let quiz_id = required_quiz_id(req.quiz_id)?;

    let started = attempts.start_attempt(claims.identity(), &quiz_id).await?;

    Ok(Json(json!({
        "message": "Attempt started",
        "attemptId": started.attempt_id,
        "attempt": started.attempt
    })))
}

/// Page-unload signal. Browsers send it as a beacon, which cannot carry an
/// `Authorization` header, so the token may also arrive in the body.
pub async fn abandon_attempt(
    State(attempts): State<Arc<AttemptManager>>,
    State(config): State<Config>,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<QuizAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = request_token(&headers, &uri)
        .or(req.token)
        .ok_or(AppError::AuthError("No token".to_string()))?;
    let claims = verify_jwt(&token, &config.jwt_secret)?;
    let quiz_id = required_quiz_id(req.quiz_id)?;

    let message = match attempts.abandon_attempt(claims.identity(), &quiz_id).await? {
        AbandonOutcome::Abandoned => "Attempt abandoned",
        AbandonOutcome::NothingToDo => "No active attempt",
    };

    Ok(Json(json!({ "message": message })))
}

/// Records the score of the caller's open attempt.
pub async fn submit_attempt(
    State(attempts): State<Arc<AttemptManager>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(QUIZ_TAKERS, QUIZ_TAKERS_ONLY)?;

    let (Some(quiz_id), Some(raw_score)) = (req.quiz_id, req.score) else {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    };
    let score = parse_score(&raw_score)
        .ok_or(AppError::BadRequest("Score must be numeric".to_string()))?;

    let attempt = attempts
        .submit_attempt(claims.identity(), &quiz_id, score)
        .await?;

    Ok(Json(json!({
        "message": "Attempt recorded",
        "attempt": attempt
    })))
}

/// Session state for client polling: `none`, `active` or `expired`.
pub async fn attempt_status(
    State(attempts): State<Arc<AttemptManager>>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let status = attempts.status_of(claims.identity(), &quiz_id).await?;
    Ok(Json(json!({ "status": status })))
}
