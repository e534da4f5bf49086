use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Row};

use super::{RatingStore, Repository, StoreError, StoreResult};
use crate::models::{Movie, MovieId, NewMovie, NewUser, Rating, RatingOutcome, User, UserId};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Store backed by the `users`, `movies` and `ratings` tables (see `schema.sql`)
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Moves a SERIAL sequence past ids that were inserted explicitly
    async fn sync_sequence(&self, table: &str, column: &str) -> StoreResult<()> {
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', '{column}'), \
             COALESCE((SELECT MAX({column}) FROM {table}), 0) + 1, false)"
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RatingStore for PgStore {
    async fn ratings_for_user(&self, user_id: UserId) -> StoreResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT rating_id, user_id, movie_id, score
            FROM ratings
            WHERE user_id = $1
            ORDER BY rating_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn ratings_for_movie(&self, movie_id: MovieId) -> StoreResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT rating_id, user_id, movie_id, score
            FROM ratings
            WHERE movie_id = $1
            ORDER BY rating_id
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }
}

#[async_trait::async_trait]
impl Repository for PgStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT user_id, email, password, age, zipcode FROM users ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, email, password, age, zipcode FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password, age, zipcode
            FROM users
            WHERE email = $1
            ORDER BY user_id
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password, age, zipcode
            FROM users
            WHERE email = $1 AND password = $2
            ORDER BY user_id
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn add_user(&self, new_user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, age, zipcode)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, email, password, age, zipcode
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password)
        .bind(new_user.age)
        .bind(new_user.zipcode)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, password, age, zipcode)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id)
        .bind(user.email)
        .bind(user.password)
        .bind(user.age)
        .bind(user.zipcode)
        .execute(&self.pool)
        .await?;

        self.sync_sequence("users", "user_id").await
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT movie_id, title, released_at, imdb_url FROM movies ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn get_movie(&self, movie_id: MovieId) -> StoreResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT movie_id, title, released_at, imdb_url FROM movies WHERE movie_id = $1",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn add_movie(&self, new_movie: NewMovie) -> StoreResult<Movie> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (title, released_at, imdb_url)
            VALUES ($1, $2, $3)
            RETURNING movie_id, title, released_at, imdb_url
            "#,
        )
        .bind(new_movie.title)
        .bind(new_movie.released_at)
        .bind(new_movie.imdb_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn insert_movie(&self, movie: Movie) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO movies (movie_id, title, released_at, imdb_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(movie.movie_id)
        .bind(movie.title)
        .bind(movie.released_at)
        .bind(movie.imdb_url)
        .execute(&self.pool)
        .await?;

        self.sync_sequence("movies", "movie_id").await
    }

    async fn get_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> StoreResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            SELECT rating_id, user_id, movie_id, score
            FROM ratings
            WHERE user_id = $1 AND movie_id = $2
            ORDER BY rating_id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rating)
    }

    async fn add_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> StoreResult<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, movie_id, score)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            RETURNING rating_id, user_id, movie_id, score
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?;

        rating.ok_or(StoreError::DuplicateRating { user_id, movie_id })
    }

    async fn upsert_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> StoreResult<(Rating, RatingOutcome)> {
        // xmax is 0 only on a row version created by this INSERT
        let row = sqlx::query(
            r#"
            INSERT INTO ratings (user_id, movie_id, score)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET score = EXCLUDED.score
            RETURNING rating_id, user_id, movie_id, score, (xmax = 0) AS inserted
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        let rating = Rating::from_row(&row)?;
        let outcome = if row.try_get::<bool, _>("inserted")? {
            RatingOutcome::Added
        } else {
            RatingOutcome::Updated
        };

        Ok((rating, outcome))
    }
}
