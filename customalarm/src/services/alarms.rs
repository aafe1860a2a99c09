//! Alarm list view model
//!
//! Subscribes once to the repository's list stream and exposes the
//! latest snapshot to the UI. Commands are fire-and-forget: the UI sees
//! their effect when the next snapshot arrives.

use super::dispatcher::{Command, Dispatcher};
use crate::alarms::{Alarm, AlarmStream, AlarmsRepository};
use std::sync::Arc;

/// State projection for the alarm list screen
pub struct AlarmsViewModel {
    repo: Arc<dyn AlarmsRepository>,
    dispatcher: Dispatcher,
    alarms: AlarmStream<Vec<Alarm>>,
}

impl AlarmsViewModel {
    pub fn new(repo: Arc<dyn AlarmsRepository>, dispatcher: Dispatcher) -> Self {
        let alarms = repo.list();
        Self {
            repo,
            dispatcher,
            alarms,
        }
    }

    /// Cached latest list
    pub fn alarms(&self) -> Vec<Alarm> {
        self.alarms.latest()
    }

    /// Independent subscription for re-rendering; starts with the latest list.
    pub fn changes(&self) -> AlarmStream<Vec<Alarm>> {
        self.alarms.clone()
    }

    pub fn add_alarm(&self, alarm: Alarm) -> Command {
        tracing::info!("Adding alarm: {}", alarm.id);
        let repo = Arc::clone(&self.repo);
        self.dispatcher
            .submit("add alarm", async move { repo.add(alarm).await })
    }

    pub fn toggle_alarm(&self, alarm_id: &str, enabled: bool) -> Command {
        tracing::info!("Toggling alarm {} to enabled={}", alarm_id, enabled);
        let repo = Arc::clone(&self.repo);
        let alarm_id = alarm_id.to_string();
        self.dispatcher.submit("toggle alarm", async move {
            repo.toggle(&alarm_id, enabled).await
        })
    }
}
