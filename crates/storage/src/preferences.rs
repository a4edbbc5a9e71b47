//! Durable boolean preference with a replaying change stream.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, stream::BoxStream, StreamExt};
use shared::{
    domain::{PreferenceEntry, PreferenceKey},
    error::StorageError,
};
use sqlx::Row;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::Storage;

/// Reactive read plus atomic toggle of a single boolean flag.
#[async_trait]
pub trait PreferenceSource: Send + Sync {
    /// Current value first, then every committed change. Never ends on its own.
    fn read(&self) -> BoxStream<'static, bool>;

    /// Flips the stored value and returns the new one.
    async fn toggle(&self) -> Result<bool, StorageError>;
}

#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<PreferenceStoreInner>,
}

struct PreferenceStoreInner {
    storage: Storage,
    key: PreferenceKey,
    channel: Arc<PreferenceChannel>,
}

/// Change feed and write serialization for one key, shared through `Storage`.
pub(crate) struct PreferenceChannel {
    updates: watch::Sender<bool>,
    write_lock: Mutex<()>,
}

impl Default for PreferenceChannel {
    fn default() -> Self {
        let (updates, _) = watch::channel(false);
        Self {
            updates,
            write_lock: Mutex::new(()),
        }
    }
}

impl PreferenceStore {
    pub fn new(storage: Storage, key: PreferenceKey) -> Self {
        let channel = storage.preference_channel(&key);
        Self {
            inner: Arc::new(PreferenceStoreInner {
                storage,
                key,
                channel,
            }),
        }
    }

    pub fn dark_mode(storage: Storage) -> Self {
        Self::new(storage, PreferenceKey::dark_mode())
    }

    /// One-shot read; `false` when the key has never been written.
    pub async fn load(&self) -> Result<bool, StorageError> {
        Ok(self.entry().await?.is_some_and(|entry| entry.value))
    }

    pub async fn entry(&self) -> Result<Option<PreferenceEntry>, StorageError> {
        let key = &self.inner.key;
        let row = sqlx::query(
            "SELECT value, updated_at FROM preferences WHERE namespace = ?1 AND key = ?2",
        )
        .bind(&key.namespace)
        .bind(&key.name)
        .fetch_optional(self.inner.storage.pool())
        .await
        .map_err(|err| StorageError::read(format!("failed to load {key}: {err}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value = row
            .try_get::<i64, _>("value")
            .map_err(|err| StorageError::read(format!("corrupt value for {key}: {err}")))?
            != 0;
        let updated_at = row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|err| StorageError::read(format!("corrupt timestamp for {key}: {err}")))?;

        Ok(Some(PreferenceEntry {
            key: key.clone(),
            value,
            updated_at,
        }))
    }

    pub fn read(&self) -> BoxStream<'static, bool> {
        // Subscribe before loading so a toggle racing the initial read is
        // still delivered afterwards.
        let changes = WatchStream::from_changes(self.inner.channel.updates.subscribe());
        let store = self.clone();
        stream::once(async move { store.load_or_default().await })
            .chain(changes)
            .boxed()
    }

    async fn load_or_default(&self) -> bool {
        match self.load().await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %self.inner.key, "preference read failed, using default: {err}");
                false
            }
        }
    }

    pub async fn toggle(&self) -> Result<bool, StorageError> {
        let key = &self.inner.key;
        // Held until the new value is published so readers see commit order.
        let _guard = self.inner.channel.write_lock.lock().await;

        let row = sqlx::query(
            "INSERT INTO preferences (namespace, key, value, updated_at)
             VALUES (?1, ?2, 1, CURRENT_TIMESTAMP)
             ON CONFLICT(namespace, key) DO UPDATE SET
                value = NOT value,
                updated_at = CURRENT_TIMESTAMP
             RETURNING value",
        )
        .bind(&key.namespace)
        .bind(&key.name)
        .fetch_one(self.inner.storage.pool())
        .await
        .map_err(|err| StorageError::write(format!("failed to toggle {key}: {err}")))?;

        let value = row
            .try_get::<i64, _>("value")
            .map_err(|err| {
                StorageError::write(format!("unexpected toggle result for {key}: {err}"))
            })?
            != 0;

        self.inner.channel.updates.send_replace(value);
        debug!(key = %key, value, "preference toggled");
        Ok(value)
    }
}

#[async_trait]
impl PreferenceSource for PreferenceStore {
    fn read(&self) -> BoxStream<'static, bool> {
        PreferenceStore::read(self)
    }

    async fn toggle(&self) -> Result<bool, StorageError> {
        PreferenceStore::toggle(self).await
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
