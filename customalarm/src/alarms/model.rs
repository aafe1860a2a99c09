//! Alarm domain model
//!
//! An `Alarm` is an immutable value compared field by field. Mutations
//! always produce a new value; the repository replaces its stored copy.

use crate::config::{DEFAULT_ALARM_NAME, DEFAULT_ALARM_TIME};
use crate::error::{AppError, Result};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One alarm record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// Stable for the alarm's lifetime, never reused
    pub id: String,
    pub name: String,
    /// Zero-padded `HH:MM`
    pub time: String,
    pub enabled: bool,
}

impl Alarm {
    /// Creates a disabled alarm with a freshly generated id.
    pub fn new(name: impl Into<String>, time: impl Into<String>) -> Self {
        Self::with_id(new_alarm_id(), name, time, false)
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        time: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            time: time.into(),
            enabled,
        }
    }

    /// Hour and minute of `time`, or `None` if it is not well-formed.
    pub fn hour_minute(&self) -> Option<(u32, u32)> {
        parse_time(&self.time)
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new(DEFAULT_ALARM_NAME, DEFAULT_ALARM_TIME)
    }
}

/// Generates a globally unique alarm id
pub fn new_alarm_id() -> String {
    Uuid::new_v4().to_string()
}

/// Formats an hour/minute pair as `HH:MM`.
///
/// Rejects hours outside `0..=23` and minutes outside `0..=59`.
pub fn format_time(hour: u32, minute: u32) -> Result<String> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .map(|time| time.format("%H:%M").to_string())
        .ok_or_else(|| AppError::InvalidTime(format!("{}:{} is out of range", hour, minute)))
}

/// Parses a strict zero-padded `HH:MM` value.
pub fn parse_time(value: &str) -> Option<(u32, u32)> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }

    NaiveTime::parse_from_str(value, "%H:%M")
        .ok()
        .map(|time| (time.hour(), time.minute()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_alarm_has_fresh_id_and_is_disabled() {
        let first = Alarm::new("Work", "08:30");
        let second = Alarm::new("Work", "08:30");

        assert_ne!(first.id, second.id);
        assert!(!first.enabled);
        assert_eq!(first.name, "Work");
    }

    #[test]
    fn test_default_alarm() {
        let alarm = Alarm::default();
        assert_eq!(alarm.name, "Alarm");
        assert_eq!(alarm.time, "07:00");
        assert!(!alarm.id.is_empty());
    }

    #[test]
    fn test_format_time_pads_and_validates() {
        assert_eq!(format_time(7, 5).unwrap(), "07:05");
        assert_eq!(format_time(23, 59).unwrap(), "23:59");
        assert_eq!(format_time(0, 0).unwrap(), "00:00");

        assert!(matches!(format_time(24, 0), Err(AppError::InvalidTime(_))));
        assert!(matches!(format_time(12, 60), Err(AppError::InvalidTime(_))));
    }

    #[test]
    fn test_parse_time_is_strict() {
        assert_eq!(parse_time("05:45"), Some((5, 45)));
        assert_eq!(parse_time("00:00"), Some((0, 0)));

        assert_eq!(parse_time("5:45"), None);
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:61"), None);
        assert_eq!(parse_time("1245"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_alarms_compare_by_value() {
        let a = Alarm::with_id("1", "Old", "06:00", false);
        let b = Alarm::with_id("1", "Old", "06:00", false);
        assert_eq!(a, b);
        assert_ne!(a, Alarm { enabled: true, ..b });
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let alarm = Alarm::with_id("1", "Gym", "06:15", true);
        let json = serde_json::to_value(&alarm).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["time"], "06:15");
        assert_eq!(json["enabled"], true);
    }
}
