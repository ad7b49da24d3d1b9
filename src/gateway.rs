use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::alarm::{Alarm, AlarmId, RepeatDays};

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Notification authorization was denied")]
    PermissionDenied,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Text shown on every alert. The body falls back to `default_body` for unlabeled alarms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationContent {
    pub title: String,
    pub default_body: String,
}

impl Default for NotificationContent {
    fn default() -> Self {
        Self {
            title: "Alarm".to_owned(),
            default_body: "Time to wake up!".to_owned(),
        }
    }
}

/// Trigger registration derived from an alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub id: AlarmId,
    pub title: String,
    pub body: String,
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
    pub weekdays: RepeatDays,
}

impl NotificationRequest {
    pub fn from_alarm(alarm: &Alarm, content: &NotificationContent) -> Self {
        let body = if alarm.label.is_empty() {
            content.default_body.clone()
        } else {
            alarm.label.clone()
        };

        Self {
            id: alarm.id,
            title: content.title.clone(),
            body,
            hour: alarm.time.hour(),
            minute: alarm.time.minute(),
            repeats: alarm.repeats(),
            weekdays: alarm.repeat_days,
        }
    }
}

#[async_trait]
pub trait NotificationGateway: Send + Sync + 'static {
    /// One-time permission prompt, run during bootstrap before the store is used.
    async fn request_authorization(&self) -> Result<bool, SchedulingError>;

    /// Registers a trigger under `alarm.id`, replacing any pending one.
    async fn schedule(&self, alarm: &Alarm) -> Result<(), SchedulingError>;

    /// Removes the pending trigger under `id`. Does nothing if there is none.
    async fn cancel(&self, id: AlarmId) -> Result<(), SchedulingError>;
}
