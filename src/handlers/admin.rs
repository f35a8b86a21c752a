// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    attempts::AttemptManager,
    catalog::Catalog,
    error::AppError,
    models::{
        quiz::{CreateQuizRequest, UpdateQuizRequest},
        user::Role,
    },
    utils::jwt::Claims,
};

const ADMIN_ONLY: &str = "Admin only";

/// Lists every quiz, including inactive ones and their answers.
/// Admin only.
pub async fn list_quizzes(
    State(catalog): State<Arc<Catalog>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(catalog.list_all().await?))
}

/// Creates a new quiz.
/// Admin only.
pub async fn create_quiz(
    State(catalog): State<Arc<Catalog>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(&[Role::Admin], ADMIN_ONLY)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = catalog.create(payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates the provided fields of a quiz, including its active flag.
/// Admin only.
pub async fn update_quiz(
    State(catalog): State<Arc<Catalog>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(&[Role::Admin], ADMIN_ONLY)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = catalog
        .update(&id, payload)
        .await?
        .ok_or(AppError::NotFound("Not found".to_string()))?;
    Ok(Json(quiz))
}

/// Deletes a quiz. Attempt history is kept.
/// Admin only.
pub async fn delete_quiz(
    State(catalog): State<Arc<Catalog>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(&[Role::Admin], ADMIN_ONLY)?;

    if !catalog.delete(&id).await? {
        return Err(AppError::NotFound("Not found".to_string()));
    }
    Ok(Json(json!({ "message": "Deleted" })))
}

/// Raw attempt book across all identities.
/// Admin only.
pub async fn list_all_attempts(
    State(attempts): State<Arc<AttemptManager>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(attempts.list_all_attempts().await?))
}
