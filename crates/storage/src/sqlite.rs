//! SQLite-backed log implementation.

use crate::model::now_ms;
use crate::{
    NewParameters, NewSample, ParameterLog, ParameterSet, Sample, StoreError, TelemetryLog,
};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Rows fetched per round trip while streaming the full history.
const EXPORT_BATCH: i64 = 500;

/// Durable store holding both append-only logs.
///
/// `id` values come from `INTEGER PRIMARY KEY AUTOINCREMENT`, so the
/// sequence survives restarts and ids are never reused. Each append is a
/// single `INSERT .. RETURNING`: the id is assigned and the row made
/// durable in one statement, so readers can never observe a half-written
/// record.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) a file-backed store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        // SQLite permits limited write concurrency; a single pooled
        // connection avoids "database is locked" failures under axum
        // concurrency while keeping appends serialized.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "opened sqlite store");
        Ok(store)
    }

    /// Open an in-memory store. Used as the injected test double; same
    /// code path as the file-backed store.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // The database lives inside the single connection; never recycle it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS parameters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kp REAL NOT NULL,
                ki REAL NOT NULL,
                kd REAL NOT NULL,
                setpoint REAL NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                temperature REAL NOT NULL,
                output REAL NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ParameterLog for SqliteStore {
    async fn submit(&self, new: NewParameters) -> Result<ParameterSet, StoreError> {
        new.validate()?;

        let created: ParameterSet = sqlx::query_as(
            "INSERT INTO parameters (kp, ki, kd, setpoint, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, kp, ki, kd, setpoint, created_at",
        )
        .bind(new.kp)
        .bind(new.ki)
        .bind(new.kd)
        .bind(new.setpoint)
        .bind(now_ms())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = created.id, "appended parameter set");
        Ok(created)
    }

    async fn latest(&self) -> Result<Option<ParameterSet>, StoreError> {
        let row = sqlx::query_as(
            "SELECT id, kp, ki, kd, setpoint, created_at
             FROM parameters ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parameters")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

#[async_trait]
impl TelemetryLog for SqliteStore {
    async fn record(&self, new: NewSample) -> Result<Sample, StoreError> {
        new.validate()?;

        let created: Sample = sqlx::query_as(
            "INSERT INTO samples (temperature, output, created_at)
             VALUES (?, ?, ?)
             RETURNING id, temperature, output, created_at",
        )
        .bind(new.temperature)
        .bind(new.output)
        .bind(now_ms())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = created.id, "appended sample");
        Ok(created)
    }

    async fn latest(&self) -> Result<Option<Sample>, StoreError> {
        let row = sqlx::query_as(
            "SELECT id, temperature, output, created_at
             FROM samples ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn window(&self, limit: u32) -> Result<Vec<Sample>, StoreError> {
        let mut rows: Vec<Sample> = sqlx::query_as(
            "SELECT id, temperature, output, created_at
             FROM samples ORDER BY id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        // Most-recent-by-id, but the dashboard wants oldest first.
        rows.reverse();
        Ok(rows)
    }

    fn stream_all(&self) -> BoxStream<'static, Result<Sample, StoreError>> {
        let pool = self.pool.clone();
        stream::try_unfold((pool, 0i64), |(pool, after)| async move {
            let batch: Vec<Sample> = sqlx::query_as(
                "SELECT id, temperature, output, created_at
                 FROM samples WHERE id > ? ORDER BY id ASC LIMIT ?",
            )
            .bind(after)
            .bind(EXPORT_BATCH)
            .fetch_all(&pool)
            .await?;

            match batch.last() {
                Some(last) => {
                    let next = last.id;
                    Ok::<_, StoreError>(Some((
                        stream::iter(batch.into_iter().map(Ok::<Sample, StoreError>)),
                        (pool, next),
                    )))
                }
                None => Ok::<_, StoreError>(None),
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM samples")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[tokio::test]
    async fn submit_then_latest_is_read_your_write() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let created = ParameterLog::submit(
            &store,
            NewParameters {
                kp: 1.2,
                ki: 0.5,
                kd: 0.1,
                setpoint: 60.0,
            },
        )
        .await
        .unwrap();

        let latest = ParameterLog::latest(&store).await.unwrap().unwrap();
        assert_eq!(latest, created);
        assert_eq!(latest.kp, 1.2);
        assert_eq!(latest.setpoint, 60.0);
    }

    #[tokio::test]
    async fn latest_always_wins_by_id() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let mut last_id = 0;
        for i in 0..10 {
            let created = ParameterLog::submit(
                &store,
                NewParameters {
                    kp: i as f64,
                    ki: 0.0,
                    kd: 0.0,
                    setpoint: 0.0,
                },
            )
            .await
            .unwrap();
            assert!(created.id > last_id, "ids must be strictly increasing");
            last_id = created.id;
        }

        let latest = ParameterLog::latest(&store).await.unwrap().unwrap();
        assert_eq!(latest.id, last_id);
        assert_eq!(latest.kp, 9.0);
    }

    #[tokio::test]
    async fn empty_store_yields_absence_not_error() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert!(ParameterLog::latest(&store).await.unwrap().is_none());
        assert!(TelemetryLog::latest(&store).await.unwrap().is_none());
        assert!(store.window(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn window_is_bounded_and_ascending() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        for i in 0..150 {
            store
                .record(NewSample {
                    temperature: i as f64,
                    output: i as f64 / 2.0,
                })
                .await
                .unwrap();
        }

        let window = store.window(100).await.unwrap();
        assert_eq!(window.len(), 100);
        // The 100 most recent of 150, oldest first.
        assert_eq!(window.first().unwrap().temperature, 50.0);
        assert_eq!(window.last().unwrap().temperature, 149.0);
        assert!(window.windows(2).all(|w| w[0].id < w[1].id));

        let small = store.window(20).await.unwrap();
        assert_eq!(small.len(), 20);
        assert!(small.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn stream_all_covers_full_history_in_order() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        // More than one export batch.
        for i in 0..1200 {
            store
                .record(NewSample {
                    temperature: i as f64,
                    output: 0.0,
                })
                .await
                .unwrap();
        }

        let all: Vec<Sample> = store.stream_all().try_collect().await.unwrap();
        assert_eq!(all.len(), 1200);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(all[0].temperature, 0.0);
        assert_eq!(all[1199].temperature, 1199.0);
    }

    #[tokio::test]
    async fn invalid_input_writes_nothing() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let err = store
            .record(NewSample {
                temperature: f64::NAN,
                output: 1.0,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::NotFinite { .. })
        ));
        assert_eq!(TelemetryLog::count(&store).await.unwrap(), 0);

        let err = ParameterLog::submit(
            &store,
            NewParameters {
                kp: f64::INFINITY,
                ki: 1.0,
                kd: 1.0,
                setpoint: 1.0,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(ParameterLog::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn id_sequence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.db");

        let first_id = {
            let store = SqliteStore::open(&path).await.unwrap();
            store
                .record(NewSample {
                    temperature: 20.0,
                    output: 0.0,
                })
                .await
                .unwrap()
                .id
        };

        let store = SqliteStore::open(&path).await.unwrap();
        let next = store
            .record(NewSample {
                temperature: 21.0,
                output: 0.0,
            })
            .await
            .unwrap();

        assert!(next.id > first_id);
        assert_eq!(TelemetryLog::count(&store).await.unwrap(), 2);
    }
}
