//! Services module
//!
//! State projection between the UI and the repository: view models that
//! cache repository snapshots and dispatch user intents to a background
//! worker.

pub mod alarm_setup;
pub mod alarms;
pub mod dispatcher;

pub use alarm_setup::{AlarmSetUpState, AlarmSetUpUiState, AlarmSetUpViewModel, SetUpPhase};
pub use alarms::AlarmsViewModel;
pub use dispatcher::{Command, Dispatcher};
