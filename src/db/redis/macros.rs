/// Returns a cached value or computes, caches and returns it.
///
/// Expands inside an `async` function returning `AppResult`. `$cache` must
/// have `get_from_cache` and `set_in_background`; `$block` is a future
/// resolving to `AppResult<T>`. A failed cache read is logged and treated as
/// a miss.
///
/// ```rust,ignore
/// let movies: Vec<Movie> = cached!(cache, CacheKey::MovieCatalog, CATALOG_TTL, async {
///     Ok::<_, AppError>(repo.list_movies().await?)
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, loading from store");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
