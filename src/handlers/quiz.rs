// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    accounts::Accounts,
    attempts::{
        AttemptManager,
        report::{results_rows, to_csv},
    },
    catalog::{Catalog, player_view, quiz_stats},
    error::AppError,
    models::user::Role,
    utils::jwt::Claims,
};

/// Lists active quizzes (id and title). Public.
pub async fn list_quizzes(
    State(catalog): State<Arc<Catalog>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(catalog.list_active().await?))
}

/// Fetches one quiz.
///
/// * Admins get the stored quiz, inactive or not.
/// * Students and sellers get a random sample of questions with shuffled options.
/// * Everyone but admins is refused inactive quizzes.
pub async fn get_quiz(
    State(catalog): State<Arc<Catalog>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = catalog
        .get_quiz(&id)
        .await?
        .ok_or(AppError::NotFound("Not found".to_string()))?;

    if claims.role == Role::Admin {
        return Ok(Json(quiz));
    }
    if !quiz.active {
        return Err(AppError::Forbidden("Inactive quiz".to_string()));
    }

    if claims.role.takes_quizzes() {
        let view = player_view(&quiz, &mut rand::rng());
        return Ok(Json(view));
    }
    Ok(Json(quiz))
}

/// Per-quiz attempt statistics for the manager dashboard.
pub async fn manager_dashboard(
    State(catalog): State<Arc<Catalog>>,
    State(attempts): State<Arc<AttemptManager>>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = catalog.list_all().await?;
    let book = attempts.list_all_attempts().await?;

    Ok(Json(quiz_stats(&quizzes, &book)))
}

/// Downloads every attempt at a quiz as CSV. Admin or manager only.
pub async fn export_results(
    State(catalog): State<Arc<Catalog>>,
    State(attempts): State<Arc<AttemptManager>>,
    State(accounts): State<Arc<Accounts>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(&[Role::Admin, Role::Manager], "Admin or Manager only")?;

    let quiz = catalog
        .get_quiz(&id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let book = attempts.list_all_attempts().await?;
    let sellers = accounts.seller_ids().await?;
    let rows = results_rows(&book, &quiz.id, &sellers);

    tracing::info!(
        "Results exported: quiz={} rows={} by={}",
        quiz.id,
        rows.len(),
        claims.identity()
    );

    let body = to_csv(&rows)?;

    let file_name: String = quiz
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}_Results.csv\"", file_name),
            ),
        ],
        body,
    ))
}
