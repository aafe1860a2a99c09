//! Persistent alarm repository
//!
//! Implements `AlarmsRepository` on top of `AlarmStore`. Writes are
//! serialized by a single async lock held across the existence check and
//! the write it guards. Each write runs as its own tokio task, so a caller
//! that stops waiting does not cancel a write already in flight.

use super::models::AlarmEntity;
use super::store::AlarmStore;
use crate::alarms::{Alarm, AlarmStream, AlarmsRepository};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

struct Inner {
    store: AlarmStore,
    write_lock: Mutex<()>,
}

impl Inner {
    /// Row for `id`, provided it translates to an alarm. Rows the read
    /// path hides are reported missing here too.
    async fn require(&self, id: &str) -> Result<AlarmEntity> {
        self.store
            .find_by_alarm_id(id)
            .await?
            .filter(|entity| entity.to_alarm().is_some())
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}

/// SQLite-backed backend
#[derive(Clone)]
pub struct LocalAlarmsRepository {
    inner: Arc<Inner>,
}

impl LocalAlarmsRepository {
    pub fn new(store: AlarmStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Opens the store on an initialized pool
    pub async fn open(pool: SqlitePool) -> Result<Self> {
        Ok(Self::new(AlarmStore::open(pool).await?))
    }

    pub fn store(&self) -> &AlarmStore {
        &self.inner.store
    }

    /// Runs `op` under the write lock on a detached task.
    async fn write<F, Fut>(&self, op: F) -> Result<()>
    where
        F: FnOnce(Arc<Inner>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = inner.write_lock.lock().await;
            op(Arc::clone(&inner)).await
        });

        task.await
            .map_err(|e| AppError::Generic(format!("Alarm write task failed: {}", e)))?
    }
}

fn translate(entity: &AlarmEntity) -> Option<Alarm> {
    let alarm = entity.to_alarm();
    if alarm.is_none() {
        tracing::warn!(
            "Skipping untranslatable alarm row {} ({:?})",
            entity.object_id,
            entity.alarm_id
        );
    }
    alarm
}

#[async_trait]
impl AlarmsRepository for LocalAlarmsRepository {
    fn list(&self) -> AlarmStream<Vec<Alarm>> {
        AlarmStream::project(self.inner.store.subscribe(), |entities: &[AlarmEntity]| {
            entities.iter().filter_map(translate).collect()
        })
    }

    fn get_by_id(&self, id: &str) -> AlarmStream<Option<Alarm>> {
        let id = id.to_string();
        AlarmStream::project(
            self.inner.store.subscribe(),
            move |entities: &[AlarmEntity]| {
                entities
                    .iter()
                    .find(|e| e.alarm_id == id)
                    .and_then(AlarmEntity::to_alarm)
            },
        )
    }

    async fn add(&self, alarm: Alarm) -> Result<()> {
        self.write(move |inner| async move {
            let mut entity = AlarmEntity::from_alarm(&alarm);
            match inner.store.find_by_alarm_id(&alarm.id).await? {
                Some(existing) if existing.to_alarm().is_some() => {
                    return Err(AppError::DuplicateId(alarm.id));
                }
                Some(existing) => {
                    // Hidden row holding the id; overwrite it in place
                    tracing::warn!(
                        "Replacing untranslatable alarm row {} ({:?})",
                        existing.object_id,
                        existing.alarm_id
                    );
                    entity.object_id = existing.object_id;
                }
                None => {}
            }
            inner.store.put(&entity).await?;

            tracing::debug!("Added alarm: {}", alarm.id);
            Ok(())
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.write(move |inner| async move {
            let existing = inner.require(&id).await?;
            inner.store.remove(existing.object_id).await?;

            tracing::debug!("Removed alarm: {}", id);
            Ok(())
        })
        .await
    }

    async fn modify(&self, id: &str, alarm: Alarm) -> Result<()> {
        let id = id.to_string();
        self.write(move |inner| async move {
            let existing = inner.require(&id).await?;
            let replacement = Alarm {
                id: id.clone(),
                ..alarm
            };
            let updated = AlarmEntity {
                object_id: existing.object_id,
                ..AlarmEntity::from_alarm(&replacement)
            };
            inner.store.put(&updated).await?;

            tracing::debug!("Modified alarm: {}", id);
            Ok(())
        })
        .await
    }

    async fn toggle(&self, id: &str, enabled: bool) -> Result<()> {
        let id = id.to_string();
        self.write(move |inner| async move {
            let existing = inner.require(&id).await?;
            inner
                .store
                .put(&AlarmEntity {
                    is_enabled: enabled,
                    ..existing
                })
                .await?;

            tracing::debug!("Toggled alarm {} to enabled={}", id, enabled);
            Ok(())
        })
        .await
    }

    async fn assert_exists(&self, id: &str) -> Result<()> {
        self.inner.require(id).await.map(|_| ())
    }
}
