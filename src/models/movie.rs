use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Primary key of the `movies` table
pub type MovieId = i32;

/// A movie that can be rated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    pub released_at: Option<NaiveDateTime>,
    pub imdb_url: Option<String>,
}

/// Fields needed to insert a new movie
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub released_at: Option<NaiveDateTime>,
    pub imdb_url: Option<String>,
}

impl NewMovie {
    /// Creates a movie payload with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            released_at: None,
            imdb_url: None,
        }
    }

    /// Attaches the stored movie id
    pub fn into_movie(self, movie_id: MovieId) -> Movie {
        Movie {
            movie_id,
            title: self.title,
            released_at: self.released_at,
            imdb_url: self.imdb_url,
        }
    }
}
