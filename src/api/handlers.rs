use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::{RatingStore, Repository};
use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{Movie, MovieId, NewUser, Rating, User, UserId};
use crate::services::{accounts, catalog, ratings, Prediction, RatingOutcome, RecommendationError};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub user_id: UserId,
    pub other_id: UserId,
    pub similarity: f64,
}

#[derive(Debug, Deserialize)]
pub struct MovieQuery {
    pub user_id: Option<UserId>,
}

/// A movie with its ratings and, when a user is given, that user's score or
/// a predicted one
#[derive(Debug, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub ratings: Vec<Rating>,
    pub user_rating: Option<i32>,
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub score: i32,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub rating: Rating,
    pub outcome: RatingOutcome,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn require_user(state: &AppState, user_id: UserId) -> AppResult<User> {
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List all users
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

/// One user with the ratings they entered
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserDetail>> {
    let user = require_user(&state, user_id).await?;
    let ratings = state.store.ratings_for_user(user_id).await?;
    Ok(Json(UserDetail { user, ratings }))
}

/// Pearson similarity between two users
pub async fn user_similarity(
    State(state): State<AppState>,
    Path((user_id, other_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<SimilarityResponse>> {
    require_user(&state, user_id).await?;
    require_user(&state, other_id).await?;

    let similarity = state.engine().similarity(user_id, other_id).await?;

    Ok(Json(SimilarityResponse {
        user_id,
        other_id,
        similarity,
    }))
}

/// Predicted score for a movie the user has not rated
pub async fn predict_rating(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((user_id, movie_id)): Path<(UserId, MovieId)>,
) -> AppResult<Json<Prediction>> {
    require_user(&state, user_id).await?;
    catalog::get_movie(state.store.as_ref(), state.cache.as_ref(), movie_id).await?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        movie_id,
        "Processing prediction request"
    );

    let prediction = state.engine().predict(user_id, movie_id).await?;

    tracing::info!(
        request_id = %request_id,
        neighbor_id = prediction.neighbor_id,
        score = prediction.score,
        "Prediction completed"
    );

    Ok(Json(prediction))
}

/// List all movies ordered by title
pub async fn list_movies(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    let movies = catalog::list_movies(state.store.as_ref(), state.cache.as_ref()).await?;
    Ok(Json(movies))
}

/// One movie with its ratings, plus the given user's score or prediction
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
    Query(query): Query<MovieQuery>,
) -> AppResult<Json<MovieDetail>> {
    let movie = catalog::get_movie(state.store.as_ref(), state.cache.as_ref(), movie_id).await?;
    let ratings = state.store.ratings_for_movie(movie_id).await?;

    let mut user_rating = None;
    let mut prediction = None;

    if let Some(user_id) = query.user_id {
        require_user(&state, user_id).await?;

        user_rating = ratings
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.score);

        if user_rating.is_none() {
            prediction = match state.engine().predict(user_id, movie_id).await {
                Ok(prediction) => Some(prediction),
                Err(RecommendationError::NoNeighbor { .. }) => None,
                Err(e) => return Err(e.into()),
            };
        }
    }

    Ok(Json(MovieDetail {
        movie,
        ratings,
        user_rating,
        prediction,
    }))
}

/// Create or update a rating
pub async fn set_rating(
    State(state): State<AppState>,
    Json(request): Json<RatingRequest>,
) -> AppResult<(StatusCode, Json<RatingResponse>)> {
    let (rating, outcome) = ratings::set_rating(
        state.store.as_ref(),
        request.user_id,
        request.movie_id,
        request.score,
    )
    .await?;

    let (status, verb) = match outcome {
        RatingOutcome::Added => (StatusCode::CREATED, "added"),
        RatingOutcome::Updated => (StatusCode::OK, "updated"),
    };

    Ok((
        status,
        Json(RatingResponse {
            rating,
            outcome,
            message: format!("Your score of {} has been {}", rating.score, verb),
        }),
    ))
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = accounts::register(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Check credentials for an existing user
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let user = accounts::login(state.store.as_ref(), &request.email, &request.password).await?;
    Ok(Json(user))
}
