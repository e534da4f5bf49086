use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Users
        .route("/users", get(handlers::list_users))
        .route("/users/:user_id", get(handlers::get_user))
        .route(
            "/users/:user_id/similarity/:other_id",
            get(handlers::user_similarity),
        )
        .route(
            "/users/:user_id/predictions/:movie_id",
            get(handlers::predict_rating),
        )
        // Movies
        .route("/movies", get(handlers::list_movies))
        .route("/movies/:movie_id", get(handlers::get_movie))
        // Ratings
        .route("/rating", post(handlers::set_rating))
        // Accounts
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}
