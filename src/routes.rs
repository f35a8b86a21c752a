// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempts, auth, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, manager_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, attempts, admin, manager).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (config and services).
pub fn create_router(state: AppState) -> Router {
    let cors = match state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin).allow_credentials(true),
        Err(_) => {
            tracing::warn!("Ignoring invalid CORS_ORIGIN: {}", state.config.cors_origin);
            CorsLayer::new()
        }
    }
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/seller-login", post(auth::seller_login));

    // Role checks for the shared paths happen in the handlers.
    let quiz_routes = Router::new()
        .route(
            "/quizzes",
            get(quiz::list_quizzes).merge(post(admin::create_quiz).route_layer(auth.clone())),
        )
        .route(
            "/quizzes/{id}",
            get(quiz::get_quiz)
                .put(admin::update_quiz)
                .delete(admin::delete_quiz)
                .route_layer(auth.clone()),
        )
        .route(
            "/quizzes/{id}/results",
            get(quiz::export_results).route_layer(auth.clone()),
        );

    let attempt_routes = Router::new()
        .route("/attempts", get(attempts::list_my_attempts).post(attempts::submit_attempt))
        .route("/attempts/start", post(attempts::start_attempt))
        .route("/attempts/status/{quiz_id}", get(attempts::attempt_status))
        .route_layer(auth.clone())
        // Beacon requests authenticate themselves.
        .route("/attempts/abandon", post(attempts::abandon_attempt));

    // Double middleware protection: Auth first, then the role check
    let admin_routes = Router::new()
        .route("/quizzes/admin", get(admin::list_quizzes))
        .route("/attempts/all", get(admin::list_all_attempts))
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth.clone());

    let manager_routes = Router::new()
        .route("/quizzes/manager", get(quiz::manager_dashboard))
        .layer(middleware::from_fn(manager_middleware))
        .layer(auth);

    let api = Router::new()
        .merge(auth_routes)
        .merge(quiz_routes)
        .merge(attempt_routes)
        .merge(admin_routes)
        .merge(manager_routes);

    Router::new()
        .nest("/api", api)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, models::user::Role, utils::jwt::sign_jwt};

    async fn app() -> Router {
        let config = Config {
            data_dir: std::env::temp_dir().join(format!("quiz_routes_{}", uuid::Uuid::new_v4())),
            jwt_secret: "routes_secret".to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            session_timeout_ms: 60_000,
            sweep_interval_secs: 60,
            cors_origin: "http://localhost:3000".to_string(),
            port: 0,
            admin_username: None,
            admin_password: None,
            rejected_env: Vec::new(),
        };
        create_router(AppState::open(config).await.unwrap())
    }

    #[tokio::test]
    async fn attempt_routes_require_a_token() {
        let response = app()
            .await
            .oneshot(
                Request::post("/api/attempts/start")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"quizId":"q1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn quiz_list_is_public() {
        let response = app()
            .await
            .oneshot(Request::get("/api/quizzes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn query_token_is_accepted() {
        let token = sign_jwt("alice", Role::Student, "routes_secret", 600).unwrap();

        let response = app()
            .await
            .oneshot(
                Request::get(format!("/api/attempts/status/q1?token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
