//! Alarm set-up view model
//!
//! Drives the create/edit screen. Local edits only touch the in-memory
//! draft; the repository is written on `save_alarm` and `delete_alarm`.
//!
//! Loading an id that is not stored does not report an error. The draft
//! starts fresh instead, with a new id and the default time and name.

use super::dispatcher::{Command, Dispatcher};
use crate::alarms::{format_time, new_alarm_id, Alarm, AlarmsRepository};
use crate::config::{SETUP_DEFAULT_ALARM_NAME, SETUP_DEFAULT_HOUR, SETUP_DEFAULT_MINUTE};
use crate::error::{AppError, Result};
use chrono::{Local, NaiveTime, Timelike};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Fields the edit screen renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSetUpUiState {
    pub alarm_id: String,
    pub selected_hour: u32,
    pub selected_minute: u32,
    pub alarm_name: String,
}

impl Default for AlarmSetUpUiState {
    fn default() -> Self {
        Self {
            alarm_id: String::new(),
            selected_hour: SETUP_DEFAULT_HOUR,
            selected_minute: SETUP_DEFAULT_MINUTE,
            alarm_name: SETUP_DEFAULT_ALARM_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetUpPhase {
    Uninitialized,
    NewAlarm,
    /// Waiting for the stored alarm with this id
    LoadingExisting(String),
    Ready,
}

/// Full draft as published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSetUpState {
    pub ui: AlarmSetUpUiState,
    pub phase: SetUpPhase,
    pub is_loaded: bool,
    /// Whether the draft's id is known to be stored
    pub persisted: bool,
}

impl Default for AlarmSetUpState {
    fn default() -> Self {
        Self {
            ui: AlarmSetUpUiState::default(),
            phase: SetUpPhase::Uninitialized,
            is_loaded: false,
            persisted: false,
        }
    }
}

type Clock = Arc<dyn Fn() -> NaiveTime + Send + Sync>;

/// State projection for the alarm set-up screen
pub struct AlarmSetUpViewModel {
    repo: Arc<dyn AlarmsRepository>,
    dispatcher: Dispatcher,
    state: Arc<watch::Sender<AlarmSetUpState>>,
    clock: Clock,
}

impl AlarmSetUpViewModel {
    pub fn new(repo: Arc<dyn AlarmsRepository>, dispatcher: Dispatcher) -> Self {
        Self::with_clock(repo, dispatcher, || Local::now().time())
    }

    /// Uses `clock` instead of the local wall clock to seed new alarms.
    pub fn with_clock<C>(repo: Arc<dyn AlarmsRepository>, dispatcher: Dispatcher, clock: C) -> Self
    where
        C: Fn() -> NaiveTime + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(AlarmSetUpState::default());
        Self {
            repo,
            dispatcher,
            state: Arc::new(state),
            clock: Arc::new(clock),
        }
    }

    pub fn ui_state(&self) -> AlarmSetUpUiState {
        self.state.borrow().ui.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().is_loaded
    }

    pub fn phase(&self) -> SetUpPhase {
        self.state.borrow().phase.clone()
    }

    /// Delete is only offered for a draft whose id is stored.
    pub fn can_delete(&self) -> bool {
        self.state.borrow().persisted
    }

    pub fn subscribe(&self) -> watch::Receiver<AlarmSetUpState> {
        self.state.subscribe()
    }

    /// Starts a new alarm at the current wall-clock time.
    pub fn create_new_alarm(&self) {
        let now = (self.clock)();
        self.state.send_replace(AlarmSetUpState {
            ui: AlarmSetUpUiState {
                alarm_id: new_alarm_id(),
                selected_hour: now.hour(),
                selected_minute: now.minute(),
                alarm_name: SETUP_DEFAULT_ALARM_NAME.to_string(),
            },
            phase: SetUpPhase::NewAlarm,
            is_loaded: true,
            persisted: false,
        });
    }

    /// Loads the stored alarm with `alarm_id` into the draft.
    pub fn set_alarm_id(&self, alarm_id: &str) -> Command {
        let alarm_id = alarm_id.to_string();
        self.state.send_modify(|s| {
            s.ui.alarm_id = alarm_id.clone();
            s.phase = SetUpPhase::LoadingExisting(alarm_id.clone());
            s.is_loaded = false;
            s.persisted = false;
        });

        let repo = Arc::clone(&self.repo);
        let state = Arc::clone(&self.state);
        self.dispatcher.submit("load alarm", async move {
            let existing = repo.get_by_id(&alarm_id).next().await.flatten();

            state.send_modify(|s| {
                if s.phase != SetUpPhase::LoadingExisting(alarm_id.clone()) {
                    // Superseded by a newer load or a new alarm
                    return;
                }

                match existing {
                    Some(alarm) => {
                        let (hour, minute) = alarm
                            .hour_minute()
                            .unwrap_or((SETUP_DEFAULT_HOUR, SETUP_DEFAULT_MINUTE));
                        s.ui = AlarmSetUpUiState {
                            alarm_id: alarm.id,
                            selected_hour: hour,
                            selected_minute: minute,
                            alarm_name: alarm.name,
                        };
                        s.persisted = true;
                    }
                    None => {
                        tracing::info!("Alarm {} not found, starting a new one", alarm_id);
                        s.ui = AlarmSetUpUiState {
                            alarm_id: new_alarm_id(),
                            ..AlarmSetUpUiState::default()
                        };
                        s.persisted = false;
                    }
                }
                s.phase = SetUpPhase::Ready;
                s.is_loaded = true;
            });

            Ok(())
        })
    }

    /// Changes the draft time. Out-of-range values are rejected.
    pub fn on_time_changed(&self, hour: u32, minute: u32) -> Result<()> {
        format_time(hour, minute)?;
        self.state.send_modify(|s| {
            s.ui.selected_hour = hour;
            s.ui.selected_minute = minute;
        });
        Ok(())
    }

    pub fn on_alarm_name_changed(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.send_modify(|s| s.ui.alarm_name = name);
    }

    /// Commits the draft: modifies the stored alarm, or adds a new one.
    ///
    /// The draft is read when the command runs, so a save issued while an
    /// alarm is still loading commits the loaded values.
    pub fn save_alarm(&self) -> Command {
        let repo = Arc::clone(&self.repo);
        let state = Arc::clone(&self.state);
        self.dispatcher.submit("save alarm", async move {
            state.send_if_modified(|s| {
                if s.ui.alarm_id.is_empty() {
                    s.ui.alarm_id = new_alarm_id();
                    return true;
                }
                false
            });
            let draft = state.borrow().clone();

            let time = format_time(draft.ui.selected_hour, draft.ui.selected_minute)?;
            let id = draft.ui.alarm_id;
            let name = draft.ui.alarm_name;
            let current = repo.get_by_id(&id).next().await.flatten();

            match current {
                Some(current) => {
                    repo.modify(&id, Alarm { name, time, ..current }).await?;
                }
                None if draft.persisted => return Err(AppError::NotFound(id)),
                None => {
                    repo.add(Alarm::with_id(id.as_str(), name, time, false))
                        .await?;
                }
            }

            state.send_modify(|s| {
                if s.ui.alarm_id == id {
                    s.persisted = true;
                    s.phase = SetUpPhase::Ready;
                    s.is_loaded = true;
                }
            });
            tracing::info!("Saved alarm: {}", id);
            Ok(())
        })
    }

    /// Removes the stored alarm being edited. Fails with `NotFound` when
    /// the draft was never persisted.
    pub fn delete_alarm(&self) -> Command {
        let repo = Arc::clone(&self.repo);
        let state = Arc::clone(&self.state);
        self.dispatcher.submit("delete alarm", async move {
            let draft = state.borrow().clone();
            let id = draft.ui.alarm_id;

            if !draft.persisted {
                tracing::debug!("Ignoring delete of unsaved alarm {:?}", id);
                return Err(AppError::NotFound(id));
            }

            repo.remove(&id).await?;
            state.send_modify(|s| {
                if s.ui.alarm_id == id {
                    s.persisted = false;
                }
            });
            tracing::info!("Deleted alarm: {}", id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::InMemoryAlarmsRepository;

    struct Fixture {
        repo: Arc<InMemoryAlarmsRepository>,
        dispatcher: Dispatcher,
        view_model: AlarmSetUpViewModel,
    }

    fn create_fixture() -> Fixture {
        let repo = Arc::new(InMemoryAlarmsRepository::new());
        let dispatcher = Dispatcher::new();
        let view_model = AlarmSetUpViewModel::with_clock(repo.clone(), dispatcher.clone(), || {
            NaiveTime::from_hms_opt(6, 42, 10).unwrap()
        });
        Fixture {
            repo,
            dispatcher,
            view_model,
        }
    }

    #[tokio::test]
    async fn test_starts_uninitialized_with_defaults() {
        let f = create_fixture();
        assert_eq!(f.view_model.phase(), SetUpPhase::Uninitialized);
        assert_eq!(f.view_model.ui_state(), AlarmSetUpUiState::default());
        assert!(!f.view_model.is_loaded());
    }

    #[tokio::test]
    async fn test_create_new_alarm_uses_current_time() {
        let f = create_fixture();

        f.view_model.create_new_alarm();

        let state = f.view_model.ui_state();
        assert_eq!(state.selected_hour, 6);
        assert_eq!(state.selected_minute, 42);
        assert_eq!(state.alarm_name, "");
        assert!(!state.alarm_id.is_empty());
        assert_eq!(f.view_model.phase(), SetUpPhase::NewAlarm);
        assert!(f.view_model.is_loaded());
        assert!(!f.view_model.can_delete());
    }

    #[tokio::test]
    async fn test_on_time_changed_updates_hour_and_minute() {
        let f = create_fixture();

        f.view_model.on_time_changed(8, 45).unwrap();

        let state = f.view_model.ui_state();
        assert_eq!(state.selected_hour, 8);
        assert_eq!(state.selected_minute, 45);
    }

    #[tokio::test]
    async fn test_on_time_changed_rejects_out_of_range() {
        let f = create_fixture();

        assert!(matches!(
            f.view_model.on_time_changed(24, 0),
            Err(AppError::InvalidTime(_))
        ));
        assert_eq!(f.view_model.ui_state().selected_hour, SETUP_DEFAULT_HOUR);
    }

    #[tokio::test]
    async fn test_on_alarm_name_changed_updates_name() {
        let f = create_fixture();
        f.view_model.on_alarm_name_changed("Morning alarm");
        assert_eq!(f.view_model.ui_state().alarm_name, "Morning alarm");
    }

    #[tokio::test]
    async fn test_save_adds_new_alarm_when_none_exists() {
        let f = create_fixture();
        f.view_model.on_time_changed(7, 30).unwrap();
        f.view_model.on_alarm_name_changed("Work");

        let _ = f.view_model.save_alarm();
        f.dispatcher.idle().await;

        let alarms = f.repo.list().latest();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].name, "Work");
        assert_eq!(alarms[0].time, "07:30");
        assert_eq!(alarms[0].id, f.view_model.ui_state().alarm_id);
        assert!(f.view_model.can_delete());
    }

    #[tokio::test]
    async fn test_saving_new_alarm_twice_does_not_duplicate() {
        let f = create_fixture();
        f.view_model.create_new_alarm();
        f.view_model.save_alarm().outcome().await.unwrap();

        f.view_model.on_alarm_name_changed("Renamed");
        f.view_model.save_alarm().outcome().await.unwrap();

        let alarms = f.repo.list().latest();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].name, "Renamed");
        assert_eq!(alarms[0].time, "06:42");
    }

    #[tokio::test]
    async fn test_set_alarm_id_loads_existing_alarm() {
        let f = create_fixture();
        let existing = Alarm::new("Existing alarm", "05:45");
        f.repo.add(existing.clone()).await.unwrap();

        let command = f.view_model.set_alarm_id(&existing.id);
        assert_eq!(
            f.view_model.phase(),
            SetUpPhase::LoadingExisting(existing.id.clone())
        );
        command.outcome().await.unwrap();

        let state = f.view_model.ui_state();
        assert_eq!(state.alarm_id, existing.id);
        assert_eq!(state.selected_hour, 5);
        assert_eq!(state.selected_minute, 45);
        assert_eq!(state.alarm_name, "Existing alarm");
        assert_eq!(f.view_model.phase(), SetUpPhase::Ready);
        assert!(f.view_model.is_loaded());
        assert!(f.view_model.can_delete());
    }

    #[tokio::test]
    async fn test_save_modifies_existing_alarm_and_keeps_enabled() {
        let f = create_fixture();
        let existing = Alarm::with_id("1", "Old alarm", "06:00", true);
        f.repo.add(existing).await.unwrap();

        let _ = f.view_model.set_alarm_id("1");
        f.dispatcher.idle().await;
        f.view_model.on_alarm_name_changed("Updated alarm");
        f.view_model.on_time_changed(9, 15).unwrap();
        let _ = f.view_model.save_alarm();
        f.dispatcher.idle().await;

        let updated = f.repo.get_by_id("1").latest();
        assert_eq!(
            updated,
            Some(Alarm::with_id("1", "Updated alarm", "09:15", true))
        );
        assert_eq!(f.repo.list().latest().len(), 1);
    }

    #[tokio::test]
    async fn test_loading_missing_alarm_starts_fresh() {
        let f = create_fixture();

        f.view_model.set_alarm_id("missing").outcome().await.unwrap();

        let state = f.view_model.ui_state();
        assert_ne!(state.alarm_id, "missing");
        assert!(!state.alarm_id.is_empty());
        assert_eq!(state.selected_hour, SETUP_DEFAULT_HOUR);
        assert_eq!(state.selected_minute, SETUP_DEFAULT_MINUTE);
        assert_eq!(state.alarm_name, "");
        assert!(f.view_model.is_loaded());
        assert!(!f.view_model.can_delete());
    }

    #[tokio::test]
    async fn test_delete_removes_persisted_alarm() {
        let f = create_fixture();
        f.repo
            .add(Alarm::with_id("1", "Delete me", "07:00", false))
            .await
            .unwrap();

        f.view_model.set_alarm_id("1").outcome().await.unwrap();
        f.view_model.delete_alarm().outcome().await.unwrap();

        assert!(f.repo.list().latest().is_empty());
        assert!(!f.view_model.can_delete());
    }

    #[tokio::test]
    async fn test_delete_unsaved_alarm_is_not_found() {
        let f = create_fixture();
        f.repo
            .add(Alarm::with_id("keep", "Keep", "07:00", false))
            .await
            .unwrap();
        f.view_model.create_new_alarm();

        let outcome = f.view_model.delete_alarm().outcome().await;

        assert!(matches!(outcome, Err(AppError::NotFound(_))));
        assert_eq!(f.repo.list().latest().len(), 1);
    }

    #[tokio::test]
    async fn test_save_after_concurrent_delete_is_not_found() {
        let f = create_fixture();
        f.repo
            .add(Alarm::with_id("1", "Gone soon", "07:00", false))
            .await
            .unwrap();
        f.view_model.set_alarm_id("1").outcome().await.unwrap();

        f.repo.remove("1").await.unwrap();
        let outcome = f.view_model.save_alarm().outcome().await;

        assert!(matches!(outcome, Err(AppError::NotFound(id)) if id == "1"));
        assert!(f.repo.list().latest().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_loaded_flag() {
        let f = create_fixture();
        let mut rx = f.view_model.subscribe();
        assert!(!rx.borrow_and_update().is_loaded);

        f.view_model.create_new_alarm();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loaded);
    }

    #[tokio::test]
    async fn test_save_while_loading_commits_loaded_values() {
        let f = create_fixture();
        f.repo
            .add(Alarm::with_id("1", "Morning", "06:30", true))
            .await
            .unwrap();

        let _ = f.view_model.set_alarm_id("1");
        let outcome = f.view_model.save_alarm().outcome().await;

        assert!(outcome.is_ok());
        assert_eq!(
            f.repo.get_by_id("1").latest(),
            Some(Alarm::with_id("1", "Morning", "06:30", true))
        );
        let state = f.view_model.ui_state();
        assert_eq!(state.alarm_name, "Morning");
        assert_eq!((state.selected_hour, state.selected_minute), (6, 30));
    }

    #[tokio::test]
    async fn test_delete_while_loading_waits_for_load() {
        let f = create_fixture();
        f.repo
            .add(Alarm::with_id("1", "Delete me", "07:00", false))
            .await
            .unwrap();

        let _ = f.view_model.set_alarm_id("1");
        assert_eq!(f.view_model.phase(), SetUpPhase::LoadingExisting("1".to_string()));
        f.view_model.delete_alarm().outcome().await.unwrap();

        assert!(f.repo.list().latest().is_empty());
        assert!(!f.view_model.can_delete());
    }

    #[tokio::test]
    async fn test_delete_while_loading_missing_alarm_is_not_found() {
        let f = create_fixture();

        let _ = f.view_model.set_alarm_id("missing");
        let outcome = f.view_model.delete_alarm().outcome().await;

        assert!(matches!(outcome, Err(AppError::NotFound(_))));
        assert_eq!(f.view_model.phase(), SetUpPhase::Ready);
    }
}
