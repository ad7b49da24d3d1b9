use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};

use crate::{
    alarm::{Alarm, AlarmId},
    gateway::{NotificationGateway, SchedulingError},
};

use super::model::{AlarmEvent, NewAlarm};

const EVENT_CAPACITY: usize = 64;

struct AlarmList {
    next_id: AlarmId,
    alarms: Vec<Alarm>,
}

/// Owns the alarm list and mirrors every change into the notification gateway.
///
/// List operations never fail. Gateway errors are logged and do not roll back
/// the list change, so a record can stay enabled without a pending trigger.
///
/// Mutations run one at a time, from the list change through the gateway call
/// to the published event. Reads are not blocked by a pending gateway call.
pub struct AlarmStore {
    state: RwLock<AlarmList>,
    mutation: Mutex<()>,
    gateway: Arc<dyn NotificationGateway>,
    events: broadcast::Sender<AlarmEvent>,
}

impl AlarmStore {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(AlarmList {
                next_id: 1,
                alarms: Vec::new(),
            }),
            mutation: Mutex::new(()),
            gateway,
            events,
        }
    }

    pub async fn add(&self, new_alarm: NewAlarm) -> Alarm {
        let _guard = self.mutation.lock().await;
        let alarm = {
            let mut state = self.state.write().await;
            let id = state.next_id;
            state.next_id += 1;
            let alarm = new_alarm.into_alarm(id);
            state.alarms.push(alarm.clone());
            alarm
        };
        log::info!(
            "Added alarm {} at {} [{}]",
            alarm.id,
            alarm.time_string(),
            alarm.repeat_days
        );

        if let Err(error) = self.gateway.schedule(&alarm).await {
            log_gateway_error("schedule", alarm.id, error);
        }

        self.publish(AlarmEvent::Added(alarm.clone()));
        alarm
    }

    /// Flips `is_enabled` and re-syncs the trigger. Unknown ids are ignored.
    pub async fn toggle(&self, id: AlarmId) {
        let _guard = self.mutation.lock().await;
        let toggled = {
            let mut state = self.state.write().await;
            state.alarms.iter_mut().find(|alarm| alarm.id == id).map(|alarm| {
                alarm.is_enabled = !alarm.is_enabled;
                alarm.clone()
            })
        };
        let Some(alarm) = toggled else {
            log::debug!("Toggle ignored, no alarm with id {id}");
            return;
        };
        log::info!("Alarm {} is now {}", id, enabled_text(alarm.is_enabled));

        if alarm.is_enabled {
            if let Err(error) = self.gateway.schedule(&alarm).await {
                log_gateway_error("schedule", id, error);
            }
        } else if let Err(error) = self.gateway.cancel(id).await {
            log_gateway_error("cancel", id, error);
        }

        self.publish(AlarmEvent::Toggled {
            id,
            is_enabled: alarm.is_enabled,
        });
    }

    /// Removes the alarm and cancels its trigger. Unknown ids are ignored.
    pub async fn delete(&self, id: AlarmId) {
        let _guard = self.mutation.lock().await;
        let removed = {
            let mut state = self.state.write().await;
            state
                .alarms
                .iter()
                .position(|alarm| alarm.id == id)
                .map(|index| state.alarms.remove(index))
        };
        if removed.is_none() {
            log::debug!("Delete ignored, no alarm with id {id}");
            return;
        }
        log::info!("Deleted alarm {id}");

        if let Err(error) = self.gateway.cancel(id).await {
            log_gateway_error("cancel", id, error);
        }

        self.publish(AlarmEvent::Deleted(id));
    }

    /// Snapshot of the alarms in insertion order.
    pub async fn list(&self) -> Vec<Alarm> {
        self.state.read().await.alarms.clone()
    }

    pub async fn get(&self, id: AlarmId) -> Option<Alarm> {
        let state = self.state.read().await;
        state.alarms.iter().find(|alarm| alarm.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.alarms.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.alarms.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlarmEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: AlarmEvent) {
        if self.events.send(event).is_err() {
            log::trace!("No subscribers for alarm event");
        }
    }
}

fn enabled_text(is_enabled: bool) -> &'static str {
    if is_enabled { "enabled" } else { "disabled" }
}

fn log_gateway_error(action: &str, id: AlarmId, error: SchedulingError) {
    match error {
        SchedulingError::PermissionDenied => log::warn!(
            "Could not {action} notification for alarm {id}: notifications are not authorized"
        ),
        SchedulingError::Failed(error) => {
            log::error!("Could not {action} notification for alarm {id}: {error:#}")
        }
    }
}
