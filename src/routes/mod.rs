pub mod analytics;
pub mod auth;
pub mod health;
pub mod quiz;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{
        auth::require_admin,
        rate_limit::{rps_middleware, RateLimiter},
    },
    AppState,
};

pub fn app(state: AppState) -> Router {
    let generate_api = Router::new()
        .route("/api/quiz/generate", post(quiz::generate_quiz))
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.quiz_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route("/api/analytics/questions", get(analytics::question_analytics))
        .layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/quiz/question-types", get(quiz::question_types))
        .route("/api/quiz/questions", get(quiz::random_questions))
        .route("/api/quiz/explain", post(quiz::explain))
        .route("/api/analytics/log", post(analytics::log_answer))
        .route("/api/auth/login", post(auth::login))
        .merge(generate_api)
        .merge(admin_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
