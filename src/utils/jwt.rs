// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode, Uri, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Role};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the identity attempts are grouped under:
    /// the username for accounts, the seller id for sellers.
    pub sub: String,
    /// Caller role.
    pub role: Role,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn identity(&self) -> &str {
        &self.sub
    }

    /// Fails with `Forbidden` unless the caller has one of `roles`.
    pub fn require(&self, roles: &[Role], message: &str) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

/// Signs a new JWT for an identity.
///
/// Arguments:
/// * `identity`: Username or seller id.
/// * `role`: Caller role.
pub fn sign_jwt(
    identity: &str,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: identity.to_owned(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extracts the bearer token from the `Authorization` header, falling back
/// to a `?token=` query parameter.
pub fn request_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_owned);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.token)
    })
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the bearer token (header or `?token=`).
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request_token(req.headers(), req.uri()).ok_or(StatusCode::UNAUTHORIZED)?;

    match verify_jwt(&token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks if the injected `Claims` has 'admin' role.
/// If not, returns 403 Forbidden.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(req, next, Role::Admin).await
}

/// Axum Middleware: Manager Authorization. Same contract as `admin_middleware`.
pub async fn manager_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(req, next, Role::Manager).await
}

async fn require_role(req: Request<Body>, next: Next, role: Role) -> Result<Response, StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if claims.role != role {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
