//! In-memory alarm repository
//!
//! Holds the collection inside the snapshot channel itself. Each mutation
//! runs as one closure under the channel's write lock, so the existence
//! check and the write it guards can never interleave with another
//! mutation. The collection is replaced wholesale on every change.

use super::model::Alarm;
use super::repository::AlarmsRepository;
use super::stream::{AlarmStream, Snapshot};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use tokio::sync::watch;

/// Process-local backend
pub struct InMemoryAlarmsRepository {
    alarms: watch::Sender<Snapshot<Alarm>>,
}

impl InMemoryAlarmsRepository {
    pub fn new() -> Self {
        Self::with_alarms(Vec::new())
    }

    /// Starts from an existing collection. Duplicate ids keep the first copy.
    pub fn with_alarms(alarms: Vec<Alarm>) -> Self {
        let mut unique: Vec<Alarm> = Vec::with_capacity(alarms.len());
        for alarm in alarms {
            if !unique.iter().any(|a| a.id == alarm.id) {
                unique.push(alarm);
            }
        }

        let (alarms, _) = watch::channel(Snapshot::initial(unique));
        Self { alarms }
    }

    /// Applies `change` to the current collection and publishes the result.
    /// Nothing is published when `change` fails.
    fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&[Alarm]) -> Result<Vec<Alarm>>,
    {
        let mut outcome = Ok(());
        self.alarms
            .send_if_modified(|snapshot| match change(snapshot.items()) {
                Ok(next) => {
                    *snapshot = snapshot.next(next);
                    true
                }
                Err(err) => {
                    outcome = Err(err);
                    false
                }
            });
        outcome
    }
}

impl Default for InMemoryAlarmsRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn require_exists(alarms: &[Alarm], id: &str) -> Result<()> {
    if alarms.iter().any(|a| a.id == id) {
        Ok(())
    } else {
        Err(AppError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl AlarmsRepository for InMemoryAlarmsRepository {
    fn list(&self) -> AlarmStream<Vec<Alarm>> {
        AlarmStream::project(self.alarms.subscribe(), |alarms: &[Alarm]| alarms.to_vec())
    }

    fn get_by_id(&self, id: &str) -> AlarmStream<Option<Alarm>> {
        let id = id.to_string();
        AlarmStream::project(self.alarms.subscribe(), move |alarms: &[Alarm]| {
            alarms.iter().find(|a| a.id == id).cloned()
        })
    }

    async fn add(&self, alarm: Alarm) -> Result<()> {
        let id = alarm.id.clone();
        self.mutate(|alarms| {
            if alarms.iter().any(|a| a.id == alarm.id) {
                return Err(AppError::DuplicateId(alarm.id.clone()));
            }
            let mut next = alarms.to_vec();
            next.push(alarm);
            Ok(next)
        })?;

        tracing::debug!("Added alarm: {}", id);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.mutate(|alarms| {
            require_exists(alarms, id)?;
            Ok(alarms.iter().filter(|a| a.id != id).cloned().collect())
        })?;

        tracing::debug!("Removed alarm: {}", id);
        Ok(())
    }

    async fn modify(&self, id: &str, alarm: Alarm) -> Result<()> {
        let replacement = Alarm {
            id: id.to_string(),
            ..alarm
        };
        self.mutate(|alarms| {
            require_exists(alarms, id)?;
            Ok(alarms
                .iter()
                .map(|a| if a.id == id { replacement.clone() } else { a.clone() })
                .collect())
        })?;

        tracing::debug!("Modified alarm: {}", id);
        Ok(())
    }

    async fn toggle(&self, id: &str, enabled: bool) -> Result<()> {
        self.mutate(|alarms| {
            require_exists(alarms, id)?;
            Ok(alarms
                .iter()
                .map(|a| {
                    if a.id == id {
                        Alarm { enabled, ..a.clone() }
                    } else {
                        a.clone()
                    }
                })
                .collect())
        })?;

        tracing::debug!("Toggled alarm {} to enabled={}", id, enabled);
        Ok(())
    }

    async fn assert_exists(&self, id: &str) -> Result<()> {
        require_exists(self.alarms.borrow().items(), id)
    }
}
