//! Persistence for users, movies and ratings
//!
//! The recommender only ever sees [`RatingStore`]; the web layer works
//! against the wider [`Repository`]. Both Postgres and an in-memory store
//! implement them.
use crate::models::{Movie, MovieId, NewMovie, NewUser, Rating, RatingOutcome, User, UserId};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use self::redis::cache;
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};

/// Errors raised by a store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User {user_id} has already rated movie {movie_id}")]
    DuplicateRating { user_id: UserId, movie_id: MovieId },

    #[error("Seed data error: {0}")]
    Seed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only access to rating observations
///
/// Both lists are returned in insertion order. An empty list means "no data",
/// not an error.
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// All ratings entered by a user
    async fn ratings_for_user(&self, user_id: UserId) -> StoreResult<Vec<Rating>>;

    /// All ratings entered for a movie
    async fn ratings_for_movie(&self, movie_id: MovieId) -> StoreResult<Vec<Rating>>;
}

/// Full record access used by the HTTP handlers and the seeder
#[async_trait::async_trait]
pub trait Repository: RatingStore {
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Finds the user whose email and plaintext password both match
    async fn get_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>>;

    async fn add_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Inserts a user keeping an externally assigned id
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    /// All movies ordered by title
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;

    async fn get_movie(&self, movie_id: MovieId) -> StoreResult<Option<Movie>>;

    async fn add_movie(&self, new_movie: NewMovie) -> StoreResult<Movie>;

    /// Inserts a movie keeping an externally assigned id
    async fn insert_movie(&self, movie: Movie) -> StoreResult<()>;

    async fn get_rating(&self, user_id: UserId, movie_id: MovieId)
        -> StoreResult<Option<Rating>>;

    /// Inserts a new rating
    ///
    /// Fails with [`StoreError::DuplicateRating`] when the user has already
    /// rated the movie.
    async fn add_rating(&self, user_id: UserId, movie_id: MovieId, score: i32)
        -> StoreResult<Rating>;

    /// Adds the rating, or changes the score of the existing one in place
    ///
    /// The check and the write are a single step, so concurrent callers for
    /// the same pair never end up with two rows.
    async fn upsert_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> StoreResult<(Rating, RatingOutcome)>;
}
