use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{MovieId, Rating, UserId},
};

pub use crate::models::RatingOutcome;

/// Lowest score the rating form accepts
pub const MIN_SCORE: i32 = 1;
/// Highest score the rating form accepts
pub const MAX_SCORE: i32 = 5;

/// Creates or updates the user's rating for a movie
pub async fn set_rating<R: Repository + ?Sized>(
    repo: &R,
    user_id: UserId,
    movie_id: MovieId,
    score: i32,
) -> AppResult<(Rating, RatingOutcome)> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(AppError::InvalidInput(format!(
            "Score must be between {} and {}, got {}",
            MIN_SCORE, MAX_SCORE, score
        )));
    }

    if repo.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {}", user_id)));
    }
    if repo.get_movie(movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Movie {}", movie_id)));
    }

    let (rating, outcome) = repo.upsert_rating(user_id, movie_id, score).await?;
    tracing::info!(user_id, movie_id, score, ?outcome, "Rating saved");
    Ok((rating, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, RatingStore};
    use crate::models::{NewMovie, NewUser};

    async fn seeded() -> (MemoryStore, UserId, MovieId) {
        let store = MemoryStore::new();
        let user = store.add_user(NewUser::new("a@example.com", "pw")).await.unwrap();
        let movie = store.add_movie(NewMovie::new("Heat")).await.unwrap();
        (store, user.user_id, movie.movie_id)
    }

    #[tokio::test]
    async fn test_add_then_update() {
        let (store, user_id, movie_id) = seeded().await;

        let (first, outcome) = set_rating(&store, user_id, movie_id, 3).await.unwrap();
        assert_eq!(outcome, RatingOutcome::Added);

        let (second, outcome) = set_rating(&store, user_id, movie_id, 5).await.unwrap();
        assert_eq!(outcome, RatingOutcome::Updated);
        assert_eq!(second.rating_id, first.rating_id);
        assert_eq!(store.ratings_for_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_one_rating() {
        let (store, user_id, movie_id) = seeded().await;
        let tasks: Vec<_> = (1..=5)
            .map(|score| {
                let store = store.clone();
                tokio::spawn(async move { set_rating(&store, user_id, movie_id, score).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for task in tasks {
            let (_, outcome) = task.await.unwrap().unwrap();
            outcomes.push(outcome);
        }

        assert_eq!(
            outcomes.iter().filter(|o| **o == RatingOutcome::Added).count(),
            1
        );
        assert_eq!(store.ratings_for_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_score_out_of_range() {
        let (store, user_id, movie_id) = seeded().await;
        for score in [0, 6, -1] {
            let result = set_rating(&store, user_id, movie_id, score).await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_unknown_movie() {
        let (store, user_id, _) = seeded().await;
        let result = set_rating(&store, user_id, 999, 4).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
