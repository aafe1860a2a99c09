//! CustomAlarm library
//!
//! The alarm repository abstraction, its in-memory and SQLite backends,
//! and the view models that project repository snapshots for a UI.

pub mod alarms;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;

pub use alarms::{Alarm, AlarmStream, AlarmsRepository, InMemoryAlarmsRepository};
pub use app::{AppConfig, AppState, BackendKind};
pub use database::LocalAlarmsRepository;
pub use error::{AppError, Result};
pub use services::{AlarmSetUpViewModel, AlarmsViewModel, Command, Dispatcher};
