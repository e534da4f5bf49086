use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

/// Primary key of the `ratings` table
pub type RatingId = i32;

/// The score a user entered for a specific movie
///
/// The store keeps at most one rating per `(user_id, movie_id)` pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Rating {
    pub rating_id: RatingId,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub score: i32,
}

impl Rating {
    /// Score as a real-valued observation for the recommender
    pub fn value(&self) -> f64 {
        f64::from(self.score)
    }
}

/// Whether a submitted score created or replaced a rating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatingOutcome {
    Added,
    Updated,
}
