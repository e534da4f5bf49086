use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use crate::{
    db::{RatingStore, StoreError},
    models::{MovieId, Rating, UserId},
};

use super::correlation::pearson;

/// Error types for the recommendation engine
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    /// Nobody other than the target user has rated the movie
    #[error("no other user has rated movie {movie_id} (requested by user {user_id})")]
    NoNeighbor { user_id: UserId, movie_id: MovieId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Estimated score for a (user, movie) pair
///
/// `score` is the neighbor's score times the similarity and is not clamped
/// to the 1-5 scale: a negative similarity yields a negative prediction.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Prediction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// The most similar user who rated the movie
    pub neighbor_id: UserId,
    pub similarity: f64,
    pub score: f64,
}

/// Similarity of two rating vectors over the movies both have rated
///
/// Returns `0.0` when the vectors share no movie. Pairs are ordered by movie
/// id before correlating, so swapping the arguments gives the same value.
#[must_use]
pub fn similarity(ratings_a: &[Rating], ratings_b: &[Rating]) -> f64 {
    let by_movie: HashMap<MovieId, &Rating> =
        ratings_a.iter().map(|r| (r.movie_id, r)).collect();

    let mut shared: Vec<(MovieId, (f64, f64))> = ratings_b
        .iter()
        .filter_map(|other| {
            by_movie
                .get(&other.movie_id)
                .map(|mine| (other.movie_id, (mine.value(), other.value())))
        })
        .collect();

    if shared.is_empty() {
        return 0.0;
    }

    shared.sort_unstable_by_key(|(movie_id, _)| *movie_id);
    let pairs: Vec<(f64, f64)> = shared.into_iter().map(|(_, pair)| pair).collect();
    pearson(&pairs)
}

/// Nearest-neighbor rating predictor over a borrowed rating store
///
/// Holds no state of its own; every call reads fresh data from the store.
pub struct RecommendationEngine<'a, S: RatingStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RatingStore + ?Sized> RecommendationEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Pearson similarity between two users' ratings, in `[-1, 1]`
    #[instrument(level = "debug", skip(self))]
    pub async fn similarity(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<f64, RecommendationError> {
        let ratings_a = self.store.ratings_for_user(user_a).await?;
        let ratings_b = self.store.ratings_for_user(user_b).await?;
        Ok(similarity(&ratings_a, &ratings_b))
    }

    /// Predicts how `user_id` would score `movie_id`
    ///
    /// Picks the other rater of the movie with the highest similarity to the
    /// user, lowest user id on ties, and scales their score by it. Fails with
    /// [`RecommendationError::NoNeighbor`] when nobody else rated the movie.
    #[instrument(level = "debug", skip(self))]
    pub async fn predict(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<Prediction, RecommendationError> {
        let movie_ratings = self.store.ratings_for_movie(movie_id).await?;

        let mut neighbors: Vec<&Rating> = movie_ratings
            .iter()
            .filter(|r| r.user_id != user_id)
            .collect();
        // One rating per (user, movie) is the store's job; keep the first if not
        neighbors.sort_by_key(|r| (r.user_id, r.rating_id));
        neighbors.dedup_by_key(|r| r.user_id);

        let own_ratings = self.store.ratings_for_user(user_id).await?;

        let mut best: Option<(f64, &Rating)> = None;
        for neighbor in neighbors {
            let their_ratings = self.store.ratings_for_user(neighbor.user_id).await?;
            let sim = similarity(&own_ratings, &their_ratings);

            // Ascending user id order means only a strictly higher score replaces
            if best.map_or(true, |(best_sim, _)| sim > best_sim) {
                best = Some((sim, neighbor));
            }
        }

        let Some((sim, rating)) = best else {
            tracing::debug!(user_id, movie_id, "No neighbor has rated the movie");
            return Err(RecommendationError::NoNeighbor { user_id, movie_id });
        };

        let prediction = Prediction {
            user_id,
            movie_id,
            neighbor_id: rating.user_id,
            similarity: sim,
            score: rating.value() * sim,
        };

        tracing::debug!(
            neighbor_id = prediction.neighbor_id,
            similarity = prediction.similarity,
            score = prediction.score,
            "Prediction computed"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(rating_id: i32, user_id: UserId, movie_id: MovieId, score: i32) -> Rating {
        Rating {
            rating_id,
            user_id,
            movie_id,
            score,
        }
    }

    #[test]
    fn test_similarity_empty_intersection() {
        let a = vec![rating(1, 1, 10, 5), rating(2, 1, 11, 3)];
        let b = vec![rating(3, 2, 12, 4), rating(4, 2, 13, 1)];
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_similarity_ignores_unshared_movies() {
        let a = vec![
            rating(1, 1, 10, 1),
            rating(2, 1, 11, 2),
            rating(3, 1, 12, 3),
            rating(4, 1, 99, 5),
        ];
        let b = vec![
            rating(5, 2, 12, 3),
            rating(6, 2, 11, 2),
            rating(7, 2, 10, 1),
            rating(8, 2, 42, 1),
        ];
        assert!((similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_symmetric() {
        let a = vec![
            rating(1, 1, 10, 4),
            rating(2, 1, 11, 1),
            rating(3, 1, 12, 5),
            rating(4, 1, 13, 2),
            rating(5, 1, 14, 3),
        ];
        let b = vec![
            rating(6, 2, 14, 2),
            rating(7, 2, 12, 4),
            rating(8, 2, 10, 5),
            rating(9, 2, 11, 3),
            rating(10, 2, 15, 1),
        ];
        assert_eq!(similarity(&a, &b), similarity(&b, &a));
    }

    #[test]
    fn test_similarity_single_shared_movie_is_zero() {
        let a = vec![rating(1, 1, 10, 4)];
        let b = vec![rating(2, 2, 10, 2)];
        assert_eq!(similarity(&a, &b), 0.0);
    }
}
