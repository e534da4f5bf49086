use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{RatingStore, Repository, StoreError, StoreResult};
use crate::models::{
    Movie, MovieId, NewMovie, NewUser, Rating, RatingId, RatingOutcome, User, UserId,
};

/// In-process store used when no database is configured
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: BTreeMap<UserId, User>,
    movies: BTreeMap<MovieId, Movie>,
    ratings: BTreeMap<RatingId, Rating>,
}

impl MemoryStoreInner {
    fn next_user_id(&self) -> UserId {
        self.users.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_movie_id(&self) -> MovieId {
        self.movies.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_rating_id(&self) -> RatingId {
        self.ratings.keys().next_back().map_or(1, |id| id + 1)
    }

    fn find_rating_mut(&mut self, user_id: UserId, movie_id: MovieId) -> Option<&mut Rating> {
        self.ratings
            .values_mut()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
    }

    fn insert_rating(&mut self, user_id: UserId, movie_id: MovieId, score: i32) -> Rating {
        let rating = Rating {
            rating_id: self.next_rating_id(),
            user_id,
            movie_id,
            score,
        };
        self.ratings.insert(rating.rating_id, rating);
        rating
    }
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn ratings_for_user(&self, user_id: UserId) -> StoreResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .filter(|r| r.user_id == user_id)
            .copied()
            .collect())
    }

    async fn ratings_for_movie(&self, movie_id: MovieId) -> StoreResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .filter(|r| r.movie_id == movie_id)
            .copied()
            .collect())
    }
}

#[async_trait::async_trait]
impl Repository for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn get_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email) && u.password.as_deref() == Some(password))
            .cloned())
    }

    async fn add_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        let user = new_user.into_user(inner.next_user_id());
        inner.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.user_id, user);
        Ok(())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        let mut movies: Vec<Movie> = inner.movies.values().cloned().collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    async fn get_movie(&self, movie_id: MovieId) -> StoreResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.get(&movie_id).cloned())
    }

    async fn add_movie(&self, new_movie: NewMovie) -> StoreResult<Movie> {
        let mut inner = self.inner.write().await;
        let movie = new_movie.into_movie(inner.next_movie_id());
        inner.movies.insert(movie.movie_id, movie.clone());
        Ok(movie)
    }

    async fn insert_movie(&self, movie: Movie) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.movies.insert(movie.movie_id, movie);
        Ok(())
    }

    async fn get_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> StoreResult<Option<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .copied())
    }

    async fn add_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> StoreResult<Rating> {
        let mut inner = self.inner.write().await;
        if inner.find_rating_mut(user_id, movie_id).is_some() {
            return Err(StoreError::DuplicateRating { user_id, movie_id });
        }
        Ok(inner.insert_rating(user_id, movie_id, score))
    }

    async fn upsert_rating(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        score: i32,
    ) -> StoreResult<(Rating, RatingOutcome)> {
        let mut inner = self.inner.write().await;
        if let Some(rating) = inner.find_rating_mut(user_id, movie_id) {
            rating.score = score;
            return Ok((*rating, RatingOutcome::Updated));
        }
        Ok((inner.insert_rating(user_id, movie_id, score), RatingOutcome::Added))
    }
}
