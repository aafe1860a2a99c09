//! Alarm repository contract
//!
//! Every backend exposes the same operations and the same stream
//! semantics, so the state-projection layer can run against either one.

use super::model::Alarm;
use super::stream::AlarmStream;
use crate::error::Result;
use async_trait::async_trait;

/// Storage-independent access to the alarm collection.
///
/// # Invariants
/// - Alarm ids are unique across the collection.
/// - Every id-targeted mutation checks existence first, atomically with
///   the write that depends on it.
/// - A successful mutation publishes exactly one new snapshot; a failed
///   one publishes nothing.
#[async_trait]
pub trait AlarmsRepository: Send + Sync {
    /// Full snapshots of the collection in insertion order.
    fn list(&self) -> AlarmStream<Vec<Alarm>>;

    /// Snapshots projected to the alarm with `id`, `None` while absent.
    fn get_by_id(&self, id: &str) -> AlarmStream<Option<Alarm>>;

    /// Fails with `DuplicateId` if an alarm with the same id is stored.
    async fn add(&self, alarm: Alarm) -> Result<()>;

    /// Fails with `NotFound` if no alarm has `id`.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Replaces the stored fields with `alarm`'s, keeping `id`.
    /// `alarm.id` is ignored.
    async fn modify(&self, id: &str, alarm: Alarm) -> Result<()>;

    /// Updates only the `enabled` field.
    async fn toggle(&self, id: &str, enabled: bool) -> Result<()>;

    /// Existence guard: `NotFound` if missing, otherwise a no-op.
    async fn assert_exists(&self, id: &str) -> Result<()>;
}
