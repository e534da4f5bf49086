use crate::{
    cached,
    db::{cache::CATALOG_TTL, Cache, CacheKey, Repository},
    error::{AppError, AppResult},
    models::{Movie, MovieId},
};

/// All movies ordered by title, served from Redis when a cache is configured
pub async fn list_movies<R: Repository + ?Sized>(
    repo: &R,
    cache: Option<&Cache>,
) -> AppResult<Vec<Movie>> {
    let Some(cache) = cache else {
        return Ok(repo.list_movies().await?);
    };

    cached!(cache, CacheKey::MovieCatalog, CATALOG_TTL, async {
        tracing::debug!("Movie catalogue cache miss");
        Ok::<_, AppError>(repo.list_movies().await?)
    })
}

/// One movie by id, or `NotFound`
pub async fn get_movie<R: Repository + ?Sized>(
    repo: &R,
    cache: Option<&Cache>,
    movie_id: MovieId,
) -> AppResult<Movie> {
    let load = async {
        repo.get_movie(movie_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movie {}", movie_id)))
    };

    match cache {
        Some(cache) => cached!(cache, CacheKey::Movie(movie_id), CATALOG_TTL, load),
        None => load.await,
    }
}
