//! Alarms module
//!
//! This module provides the storage-independent side of the alarm
//! collection:
//! - The `Alarm` value and its `HH:MM` time helpers
//! - Versioned snapshot streams
//! - The `AlarmsRepository` contract and its in-memory backend
//!
//! The persistent backend lives in `crate::database`.

pub mod in_memory;
pub mod model;
pub mod repository;
pub mod stream;

pub use in_memory::InMemoryAlarmsRepository;
pub use model::{format_time, new_alarm_id, parse_time, Alarm};
pub use repository::AlarmsRepository;
pub use stream::{AlarmStream, Snapshot};
