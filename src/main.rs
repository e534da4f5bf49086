use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ratings_api::api::{create_router, AppState};
use ratings_api::config::Config;
use ratings_api::db::{self, Cache, MemoryStore, PgStore, Repository};
use ratings_api::seed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let store: Arc<dyn Repository> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, keeping ratings in memory");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(dir) = &config.seed_dir {
        seed::seed_from_dir(store.as_ref(), dir).await?;
    }

    let mut state = AppState::new(store);
    let mut cache_writer = None;
    if let Some(url) = &config.redis_url {
        let (cache, handle) = Cache::new(db::create_redis_client(url)?);
        state = state.with_cache(cache);
        cache_writer = Some(handle);
        tracing::info!("Movie catalogue cache enabled");
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
