use anyhow::Result;
use blobpath::{BlobBackend, LocalBlobStore, PathRegistry};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{fs, path::Path, str::FromStr, sync::Arc};
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config + command ---
    let (cfg, command) = config::AppConfig::from_env_and_args()?;
    tracing::debug!("Starting blobpath with config: {:?}", cfg);

    // --- Ensure storage directory exists ---
    if !Path::new(&cfg.storage_dir).exists() {
        fs::create_dir_all(&cfg.storage_dir)?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir);
    }

    // --- Initialize SQLite connection ---
    let db_path = Path::new(cfg.database_path());
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let options = SqliteConnectOptions::from_str(&cfg.database_url)?.create_if_missing(true);
    let db = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?,
    );

    // --- Initialize store + registry ---
    let store = LocalBlobStore::new(db, cfg.storage_dir.clone());
    store.migrate().await?;

    let backend: Arc<dyn BlobBackend> = Arc::new(store.clone());
    let registry = PathRegistry::with_backend(backend);

    handlers::path_handlers::run(command, &registry, &store).await
}
