//! Alarm entity store
//!
//! Thin entity store over the `alarms` table: put by surrogate key, get
//! all, delete by key, and a change feed. After every committed write the
//! store re-reads the table and publishes the rows as a new snapshot
//! before the write call returns.

use super::models::AlarmEntity;
use crate::alarms::Snapshot;
use crate::error::{AppError, Result};
use sqlx::SqlitePool;
use tokio::sync::watch;

const SELECT_ALARMS: &str = "SELECT object_id, alarm_id, name, time, is_enabled FROM alarms";

/// Store handle over an initialized pool
pub struct AlarmStore {
    pool: SqlitePool,
    changes: watch::Sender<Snapshot<AlarmEntity>>,
}

impl AlarmStore {
    /// Opens the store and seeds the change feed with the stored rows.
    pub async fn open(pool: SqlitePool) -> Result<Self> {
        if pool.is_closed() {
            return Err(AppError::BackendUnavailable(
                "database pool is closed".to_string(),
            ));
        }

        let rows = fetch_all(&pool).await?;
        tracing::info!("Opened alarm store with {} stored alarms", rows.len());

        let (changes, _) = watch::channel(Snapshot::initial(rows));
        Ok(Self { pool, changes })
    }

    /// All rows in insertion order
    pub async fn get_all(&self) -> Result<Vec<AlarmEntity>> {
        self.ensure_open()?;
        fetch_all(&self.pool).await
    }

    pub async fn find_by_alarm_id(&self, alarm_id: &str) -> Result<Option<AlarmEntity>> {
        self.ensure_open()?;

        let entity = sqlx::query_as::<_, AlarmEntity>(&format!(
            "{SELECT_ALARMS} WHERE alarm_id = ?"
        ))
        .bind(alarm_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(entity)
    }

    /// Inserts the entity when `object_id` is 0, otherwise overwrites the
    /// row with that surrogate key. Returns the row's surrogate key.
    pub async fn put(&self, entity: &AlarmEntity) -> Result<i64> {
        self.ensure_open()?;

        let object_id = if entity.object_id == 0 {
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO alarms (alarm_id, name, time, is_enabled)
                VALUES (?, ?, ?, ?)
                RETURNING object_id
                "#,
            )
            .bind(&entity.alarm_id)
            .bind(&entity.name)
            .bind(&entity.time)
            .bind(entity.is_enabled)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| write_error(err, &entity.alarm_id))?
        } else {
            let rows = sqlx::query(
                r#"
                UPDATE alarms SET alarm_id = ?, name = ?, time = ?, is_enabled = ?
                WHERE object_id = ?
                "#,
            )
            .bind(&entity.alarm_id)
            .bind(&entity.name)
            .bind(&entity.time)
            .bind(entity.is_enabled)
            .bind(entity.object_id)
            .execute(&self.pool)
            .await
            .map_err(|err| write_error(err, &entity.alarm_id))?
            .rows_affected();

            if rows == 0 {
                return Err(AppError::NotFound(entity.alarm_id.clone()));
            }
            entity.object_id
        };

        tracing::debug!("Stored alarm row {} ({})", object_id, entity.alarm_id);
        self.publish().await;
        Ok(object_id)
    }

    /// Deletes the row with `object_id`. Returns whether a row was removed.
    pub async fn remove(&self, object_id: i64) -> Result<bool> {
        self.ensure_open()?;

        let rows = sqlx::query("DELETE FROM alarms WHERE object_id = ?")
            .bind(object_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?
            .rows_affected();

        if rows == 0 {
            return Ok(false);
        }

        tracing::debug!("Deleted alarm row {}", object_id);
        self.publish().await;
        Ok(true)
    }

    /// Change feed: the current rows, then the rows after every write.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<AlarmEntity>> {
        self.changes.subscribe()
    }

    /// Closes the underlying pool. Every later call fails with
    /// `BackendUnavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Alarm store closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(AppError::BackendUnavailable(
                "alarm store is closed".to_string(),
            ));
        }
        Ok(())
    }

    async fn publish(&self) {
        self.publish_rows(fetch_all(&self.pool).await);
    }

    /// The write already committed, so a failed re-read is only logged.
    fn publish_rows(&self, rows: Result<Vec<AlarmEntity>>) {
        match rows {
            Ok(rows) => self
                .changes
                .send_modify(|snapshot| *snapshot = snapshot.next(rows)),
            Err(e) => tracing::warn!("Failed to publish alarm snapshot: {}", e),
        }
    }
}

async fn fetch_all(pool: &SqlitePool) -> Result<Vec<AlarmEntity>> {
    sqlx::query_as::<_, AlarmEntity>(&format!("{SELECT_ALARMS} ORDER BY object_id ASC"))
        .fetch_all(pool)
        .await
        .map_err(storage_error)
}

fn storage_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::PoolClosed => {
            AppError::BackendUnavailable("alarm store is closed".to_string())
        }
        other => AppError::Database(other),
    }
}

fn write_error(err: sqlx::Error, alarm_id: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateId(alarm_id.to_string())
        }
        _ => storage_error(err),
    }
}
