use pollbox::cache::{MemoryCache, PageCache};
use pollbox::config::Config;
use pollbox::database::{create_pool, run_migrations};
use pollbox::redis::RedisClient;
use pollbox::store::PgPollStore;
use pollbox::{AppState, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pollbox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()
        .map_err(|e| format!("Failed to load configuration (DATABASE_URL, JWT_SECRET): {}", e))?;
    tracing::info!("Configuration loaded successfully");

    let db = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    run_migrations(&db).await?;
    tracing::info!("Database migrations completed");

    let cache: Arc<dyn PageCache> = match &config.redis_url {
        Some(redis_url) => {
            let redis = RedisClient::new(redis_url).await?;
            tracing::info!("Redis page cache connected");
            Arc::new(redis)
        }
        None => {
            tracing::info!("REDIS_URL not set, using in-process page cache");
            Arc::new(MemoryCache::new())
        }
    };

    let state = AppState {
        store: Arc::new(PgPollStore::new(db)),
        cache,
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server listening on {}:{}", config.host, config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
