// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    accounts::Accounts,
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, Role, SellerLoginRequest},
    utils::jwt::sign_jwt,
};

/// Registers a new student account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created.
pub async fn register(
    State(accounts): State<Arc<Accounts>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    accounts
        .create_user(&payload.username, &payload.password, Role::Student)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "Registered" }))))
}

/// Authenticates an account and returns a JWT token.
pub async fn login(
    State(accounts): State<Arc<Accounts>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let role = accounts
        .authenticate(&payload.username, &payload.password)
        .await?;

    let token = sign_jwt(
        &payload.username,
        role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
        "username": payload.username
    })))
}

/// Seller login. Unknown seller ids are provisioned on first use.
pub async fn seller_login(
    State(accounts): State<Arc<Accounts>>,
    State(config): State<Config>,
    Json(payload): Json<SellerLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if payload.seller_id.trim().is_empty() {
        return Err(AppError::BadRequest("Seller ID is required".to_string()));
    }

    let seller = accounts.seller_login(&payload.seller_id).await?;

    let token = sign_jwt(
        &seller.seller_id,
        Role::Seller,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": Role::Seller,
        "sellerId": seller.seller_id
    })))
}
