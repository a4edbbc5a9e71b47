use anyhow::{Context, Result};
use shared::{domain::PreferenceKey, error::StorageError};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

mod preferences;

use preferences::PreferenceChannel;
pub use preferences::{PreferenceSource, PreferenceStore};

/// Shared SQLite handle. Cloning is cheap and shares the pool and the
/// per-key change channels.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    channels: Arc<Mutex<HashMap<PreferenceKey, Arc<PreferenceChannel>>>>,
}

impl Storage {
    pub async fn new(database_url: &str) -> std::result::Result<Self, StorageError> {
        Self::connect(database_url)
            .await
            .map_err(|err| StorageError::open(format!("{err:#}")))
    }

    async fn connect(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // In-memory databases live in a shared cache; a second connection
        // would hit table-level locks instead of the busy timeout.
        let max_connections = if is_in_memory(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run preference migrations")?;
        tracing::debug!(database_url, "preference storage opened");
        Ok(Self {
            pool,
            channels: Arc::default(),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> std::result::Result<(), StorageError> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StorageError::read(format!("sqlite ping failed: {err}")))?;
        Ok(())
    }

    /// Closes the pool. Every later operation fails with a `StorageError`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Every store for the same key on this handle publishes to one channel.
    fn preference_channel(&self, key: &PreferenceKey) -> Arc<PreferenceChannel> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.entry(key.clone()).or_default().clone()
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
