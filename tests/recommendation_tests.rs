use ratings_api::db::{MemoryStore, RatingStore, Repository, StoreError, StoreResult};
use ratings_api::models::{MovieId, Rating, UserId};
use ratings_api::services::{RecommendationEngine, RecommendationError};

const TOLERANCE: f64 = 1e-12;

async fn store_with(ratings: &[(UserId, MovieId, i32)]) -> MemoryStore {
    let store = MemoryStore::new();
    for &(user_id, movie_id, score) in ratings {
        store.add_rating(user_id, movie_id, score).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_prediction_with_single_neighbor() {
    // similarity(1, 2) = 0.5 over movies 1-3; user 2 rated movie 4 with 4
    let store = store_with(&[
        (1, 1, 1),
        (1, 2, 2),
        (1, 3, 3),
        (2, 1, 1),
        (2, 2, 3),
        (2, 3, 2),
        (2, 4, 4),
    ])
    .await;
    let engine = RecommendationEngine::new(&store);

    let similarity = engine.similarity(1, 2).await.unwrap();
    assert!((similarity - 0.5).abs() < TOLERANCE);

    let prediction = engine.predict(1, 4).await.unwrap();
    assert_eq!(prediction.neighbor_id, 2);
    assert!((prediction.score - 2.0).abs() < TOLERANCE);
}

#[tokio::test]
async fn test_no_neighbor_when_movie_unrated() {
    let store = store_with(&[(1, 1, 5)]).await;
    let engine = RecommendationEngine::new(&store);

    let result = engine.predict(1, 7).await;
    assert!(matches!(
        result,
        Err(RecommendationError::NoNeighbor {
            user_id: 1,
            movie_id: 7
        })
    ));
}

#[tokio::test]
async fn test_no_neighbor_when_only_target_rated() {
    let store = store_with(&[(1, 7, 3), (2, 1, 4)]).await;
    let engine = RecommendationEngine::new(&store);

    let result = engine.predict(1, 7).await;
    assert!(matches!(result, Err(RecommendationError::NoNeighbor { .. })));
}

#[tokio::test]
async fn test_tie_break_prefers_lowest_user_id() {
    // Users 3 and 5 rate movies 1-3 identically, so both are equally similar
    // to user 1; user 5's ratings go in first
    let store = store_with(&[
        (1, 1, 1),
        (1, 2, 4),
        (1, 3, 5),
        (5, 1, 2),
        (5, 2, 3),
        (5, 3, 5),
        (5, 9, 5),
        (3, 1, 2),
        (3, 2, 3),
        (3, 3, 5),
        (3, 9, 2),
    ])
    .await;
    let engine = RecommendationEngine::new(&store);

    for _ in 0..10 {
        let prediction = engine.predict(1, 9).await.unwrap();
        assert_eq!(prediction.neighbor_id, 3);
        assert_eq!(prediction.score, 2.0 * prediction.similarity);
    }
}

#[tokio::test]
async fn test_most_similar_neighbor_wins() {
    let store = store_with(&[
        (1, 1, 1),
        (1, 2, 2),
        (1, 3, 3),
        // user 2 disagrees, user 4 agrees perfectly
        (2, 1, 3),
        (2, 2, 2),
        (2, 3, 1),
        (2, 9, 5),
        (4, 1, 2),
        (4, 2, 3),
        (4, 3, 4),
        (4, 9, 3),
    ])
    .await;
    let engine = RecommendationEngine::new(&store);

    let prediction = engine.predict(1, 9).await.unwrap();
    assert_eq!(prediction.neighbor_id, 4);
    assert!((prediction.similarity - 1.0).abs() < TOLERANCE);
    assert!((prediction.score - 3.0).abs() < TOLERANCE);
}

#[tokio::test]
async fn test_negative_similarity_prediction_is_not_clamped() {
    let store = store_with(&[
        (1, 1, 1),
        (1, 2, 2),
        (1, 3, 3),
        (2, 1, 3),
        (2, 2, 2),
        (2, 3, 1),
        (2, 9, 5),
    ])
    .await;
    let engine = RecommendationEngine::new(&store);

    let prediction = engine.predict(1, 9).await.unwrap();
    assert!((prediction.similarity + 1.0).abs() < TOLERANCE);
    assert!((prediction.score + 5.0).abs() < TOLERANCE);
}

#[tokio::test]
async fn test_similarity_symmetric_and_bounded() {
    let store = store_with(&[
        (1, 1, 5),
        (1, 2, 1),
        (1, 3, 4),
        (1, 4, 2),
        (1, 6, 3),
        (2, 6, 4),
        (2, 4, 1),
        (2, 3, 5),
        (2, 1, 3),
        (2, 5, 2),
        (3, 7, 5),
    ])
    .await;
    let engine = RecommendationEngine::new(&store);

    for a in 1..=3 {
        for b in 1..=3 {
            let ab = engine.similarity(a, b).await.unwrap();
            let ba = engine.similarity(b, a).await.unwrap();
            assert!((ab - ba).abs() < TOLERANCE, "{} vs {}: {} != {}", a, b, ab, ba);
            assert!((-1.0..=1.0).contains(&ab));
        }
    }
}

#[tokio::test]
async fn test_similarity_without_shared_movies() {
    let store = store_with(&[(1, 1, 5), (1, 2, 3), (2, 3, 4), (2, 4, 1)]).await;
    let engine = RecommendationEngine::new(&store);

    assert_eq!(engine.similarity(1, 2).await.unwrap(), 0.0);
    assert_eq!(engine.similarity(1, 42).await.unwrap(), 0.0);
}

/// A store whose every read fails
struct BrokenStore;

#[async_trait::async_trait]
impl RatingStore for BrokenStore {
    async fn ratings_for_user(&self, _user_id: UserId) -> StoreResult<Vec<Rating>> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn ratings_for_movie(&self, _movie_id: MovieId) -> StoreResult<Vec<Rating>> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let store = BrokenStore;
    let engine = RecommendationEngine::new(&store);

    assert!(matches!(
        engine.predict(1, 1).await,
        Err(RecommendationError::Store(_))
    ));
    assert!(matches!(
        engine.similarity(1, 2).await,
        Err(RecommendationError::Store(_))
    ));
}
