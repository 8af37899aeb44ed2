use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{StockStateRow, StockStatus, TransitionResult};
use crate::utils::error::{AppError, Result};

type StateKey = (String, String, String);

/// Durable `(retailer, item_key, store_id) -> status` table that decides
/// whether an observation is a transition worth alerting on.
///
/// Reads go through a small pool; every write goes through a single
/// connection so a read-then-write transaction never has to upgrade its lock
/// against another writer.
pub struct StateStore {
    readers: SqlitePool,
    writer: SqlitePool,
    key_locks: Mutex<HashMap<StateKey, Arc<tokio::sync::Mutex<()>>>>,
}

/// One caller's registration on a key's lock. Dropping it unregisters the
/// key when nobody else holds or waits on it, also when the owning update
/// is cancelled mid-way.
struct KeyLock<'a> {
    store: &'a StateStore,
    key: StateKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.store.key_locks.lock() {
            // The map and this handle are the only holders.
            let idle = locks
                .get(&self.key)
                .is_some_and(|l| Arc::ptr_eq(l, &self.lock) && Arc::strong_count(l) == 2);
            if idle {
                locks.remove(&self.key);
            }
        }
    }
}

impl StateStore {
    /// Open (creating if needed) the store file and make sure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        sqlx::migrate!("./migrations").run(&writer).await?;
        tracing::debug!("State store schema ready");

        let readers = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Ok(Self {
            readers,
            writer,
            key_locks: Mutex::new(HashMap::new()),
        })
    }

    pub async fn get(&self, retailer: &str, item_key: &str, store_id: &str) -> Result<Option<StockStatus>> {
        let status = sqlx::query_scalar::<_, StockStatus>(
            "SELECT status FROM stock_state WHERE retailer = ? AND item_key = ? AND store_id = ?",
        )
        .bind(retailer)
        .bind(item_key)
        .bind(store_id)
        .fetch_optional(&self.readers)
        .await?;

        Ok(status)
    }

    /// Record a new observation and report the transition from the previous one.
    ///
    /// Callers for the same key are serialized; callers for different keys
    /// only share the database.
    pub async fn update(
        &self,
        retailer: &str,
        item_key: &str,
        store_id: &str,
        status: StockStatus,
    ) -> Result<TransitionResult> {
        let key_lock = self.register_key((retailer.to_string(), item_key.to_string(), store_id.to_string()))?;
        let _guard = key_lock.lock.lock().await;

        self.update_locked(retailer, item_key, store_id, status).await
    }

    async fn update_locked(
        &self,
        retailer: &str,
        item_key: &str,
        store_id: &str,
        status: StockStatus,
    ) -> Result<TransitionResult> {
        let mut tx = self.writer.begin().await?;

        let previous = sqlx::query_scalar::<_, StockStatus>(
            "SELECT status FROM stock_state WHERE retailer = ? AND item_key = ? AND store_id = ?",
        )
        .bind(retailer)
        .bind(item_key)
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_state (retailer, item_key, store_id, status, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(retailer, item_key, store_id)
            DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at
            "#,
        )
        .bind(retailer)
        .bind(item_key)
        .bind(store_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(TransitionResult::between(previous, status))
    }

    /// Every row, ordered by `(retailer, item_key, store_id)`.
    pub async fn dump(&self) -> Result<Vec<StockStateRow>> {
        let rows = sqlx::query_as::<_, StockStateRow>(
            r#"
            SELECT retailer, item_key, store_id, status, updated_at
            FROM stock_state
            ORDER BY retailer, item_key, store_id
            "#,
        )
        .fetch_all(&self.readers)
        .await?;

        Ok(rows)
    }

    /// Cheap round trip used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.readers).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.readers.close().await;
        self.writer.close().await;
    }

    fn register_key(&self, key: StateKey) -> Result<KeyLock<'_>> {
        let mut locks = self
            .key_locks
            .lock()
            .map_err(|e| AppError::Internal(format!("state key lock poisoned: {}", e)))?;
        let lock = Arc::clone(locks.entry(key.clone()).or_default());
        Ok(KeyLock {
            store: self,
            key,
            lock,
        })
    }
}
