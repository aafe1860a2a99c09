//! Database models
//!
//! The storage record differs from the domain `Alarm`: it carries a
//! surrogate `object_id` assigned by SQLite that addresses the row for
//! updates and deletes. The surrogate key never leaves the database layer.

use crate::alarms::{parse_time, Alarm};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored alarm row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AlarmEntity {
    /// Surrogate key, `0` until the row is first inserted
    pub object_id: i64,
    /// Domain id of the alarm
    pub alarm_id: String,
    pub name: String,
    pub time: String,
    pub is_enabled: bool,
}

impl AlarmEntity {
    /// Storage shape of `alarm`, not yet assigned a surrogate key
    pub fn from_alarm(alarm: &Alarm) -> Self {
        Self {
            object_id: 0,
            alarm_id: alarm.id.clone(),
            name: alarm.name.clone(),
            time: alarm.time.clone(),
            is_enabled: alarm.enabled,
        }
    }

    /// Domain shape of this row.
    ///
    /// Returns `None` for rows that cannot form a valid alarm (blank id or
    /// malformed time); read paths treat those as absent.
    pub fn to_alarm(&self) -> Option<Alarm> {
        if self.alarm_id.trim().is_empty() || parse_time(&self.time).is_none() {
            return None;
        }

        Some(Alarm {
            id: self.alarm_id.clone(),
            name: self.name.clone(),
            time: self.time.clone(),
            enabled: self.is_enabled,
        })
    }
}

impl From<&Alarm> for AlarmEntity {
    fn from(alarm: &Alarm) -> Self {
        Self::from_alarm(alarm)
    }
}
