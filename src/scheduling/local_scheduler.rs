use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tokio::{
    sync::{RwLock, watch},
    task,
};
use tokio_util::sync::CancellationToken;

use crate::{
    alarm::{Alarm, AlarmId},
    gateway::{NotificationContent, NotificationGateway, NotificationRequest, SchedulingError},
};

use super::{
    delivery::{AlertChannel, AlertKind},
    scheduler::{RepeatPolicy, ScheduledTrigger, next_fire_at},
};

#[derive(Debug, Clone)]
pub struct LocalSchedulerOptions {
    pub timezone: Tz,
    pub repeat_policy: RepeatPolicy,
    pub authorized: bool,
    pub cancel_timeout: Duration,
    pub cleanup_interval: Duration,
    pub content: NotificationContent,
}

impl Default for LocalSchedulerOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            repeat_policy: RepeatPolicy::default(),
            authorized: true,
            cancel_timeout: Duration::from_secs(5),
            cleanup_interval: Duration::from_secs(300),
            content: NotificationContent::default(),
        }
    }
}

struct CleanupTask(watch::Sender<()>);

type TriggerStore = RwLock<HashMap<AlarmId, ScheduledTrigger>>;

/// Gateway that keeps one tokio task per pending trigger and hands fired
/// alerts to an [`AlertChannel`]. Must be created inside a tokio runtime.
pub struct LocalAlarmScheduler {
    triggers: Arc<TriggerStore>,
    alert_channel: Arc<dyn AlertChannel>,
    options: LocalSchedulerOptions,
    cleanup_task: CleanupTask,
}

impl LocalAlarmScheduler {
    pub fn new(alert_channel: Arc<dyn AlertChannel>, options: LocalSchedulerOptions) -> Self {
        let triggers = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&triggers), options.cleanup_interval);

        Self {
            triggers,
            alert_channel,
            options,
            cleanup_task,
        }
    }

    /// Ids of alarms whose trigger is still waiting to fire, sorted.
    pub async fn pending(&self) -> Vec<AlarmId> {
        let triggers = self.triggers.read().await;
        let mut ids: Vec<AlarmId> = triggers
            .iter()
            .filter(|(_, trigger)| !trigger.is_finished())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn spawn_trigger(&self, request: NotificationRequest) -> ScheduledTrigger {
        log::info!("Starting trigger task for alarm {}", request.id);
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();
        let alert_channel = Arc::clone(&self.alert_channel);
        let timezone = self.options.timezone;
        let repeat_policy = self.options.repeat_policy;

        let task_handle = task::spawn(async move {
            run_trigger(
                request,
                timezone,
                repeat_policy,
                alert_channel.as_ref(),
                task_cancellation_token,
            )
            .await;
        });

        ScheduledTrigger::new(task_handle, cancellation_token)
    }

    fn spawn_cleanup_task(triggers: Arc<TriggerStore>, interval: Duration) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        Self::clean_finished_triggers(&triggers).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::info!("Trigger cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown_tx)
    }

    async fn clean_finished_triggers(triggers: &TriggerStore) {
        let mut triggers = triggers.write().await;
        let before = triggers.len();
        triggers.retain(|_, trigger| !trigger.is_finished());
        let after = triggers.len();

        if before != after {
            log::info!("Cleaned up {} finished triggers", before - after);
        }
    }
}

impl Drop for LocalAlarmScheduler {
    fn drop(&mut self) {
        let _ = self.cleanup_task.0.send(());
    }
}

#[async_trait]
impl NotificationGateway for LocalAlarmScheduler {
    async fn request_authorization(&self) -> Result<bool, SchedulingError> {
        log::info!(
            "Notification authorization requested. [authorized = {}]",
            self.options.authorized
        );
        Ok(self.options.authorized)
    }

    async fn schedule(&self, alarm: &Alarm) -> Result<(), SchedulingError> {
        if !self.options.authorized {
            return Err(SchedulingError::PermissionDenied);
        }

        let request = NotificationRequest::from_alarm(alarm, &self.options.content);
        let alarm_id = request.id;
        let mut triggers = self.triggers.write().await;
        if let Some(previous) = triggers.remove(&alarm_id) {
            log::info!("Replacing pending trigger for alarm {alarm_id}");
            previous.cancel(self.options.cancel_timeout).await;
        }

        let trigger = self.spawn_trigger(request);
        triggers.insert(alarm_id, trigger);

        Ok(())
    }

    async fn cancel(&self, id: AlarmId) -> Result<(), SchedulingError> {
        let removed = self.triggers.write().await.remove(&id);
        match removed {
            Some(trigger) => {
                trigger.cancel(self.options.cancel_timeout).await;
                log::info!("Cancelled trigger for alarm {id}");
            }
            None => log::debug!("No pending trigger for alarm {id}"),
        }

        Ok(())
    }
}

async fn run_trigger(
    request: NotificationRequest,
    timezone: Tz,
    repeat_policy: RepeatPolicy,
    alert_channel: &dyn AlertChannel,
    cancellation_token: CancellationToken,
) {
    let Some(fire_at) = NaiveTime::from_hms_opt(request.hour, request.minute, 0) else {
        log::error!(
            "Alarm {} has an invalid time {}:{}",
            request.id,
            request.hour,
            request.minute
        );
        return;
    };
    let weekdays = repeat_policy.weekday_filter(&request);

    alert_channel.deliver(&request, AlertKind::Scheduled).await;

    let mut last_fired: Option<DateTime<Tz>> = None;
    loop {
        let now = Utc::now().with_timezone(&timezone);
        // The sleep may end a little before the wall clock reaches the target.
        let reference = match last_fired {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        let Some(target) = next_fire_at(&fire_at, &reference, weekdays) else {
            log::error!(
                "No upcoming fire time for alarm {} at {}, stopping its trigger",
                request.id,
                fire_at
            );
            return;
        };
        let delay = (target - now).to_std().unwrap_or_default();

        log::info!(
            "[SCHEDULE] Sleeping for {:?} until {}. AlarmId {}",
            delay,
            target,
            request.id
        );

        tokio::select! {
            _ = cancellation_token.cancelled() => {
                alert_channel.deliver(&request, AlertKind::Cancelled).await;
                return;
            }
            _ = tokio::time::sleep(delay) => {
                alert_channel.deliver(&request, AlertKind::Fired).await;
            }
        }

        if !request.repeats {
            log::info!("One-shot alarm {} finished", request.id);
            return;
        }
        last_fired = Some(target);
    }
}
