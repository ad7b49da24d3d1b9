use crate::alarm::{Alarm, AlarmId, AlarmTime, RepeatDays};

/// Input for [`AlarmStore::add`](super::AlarmStore::add). New alarms always start enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub time: AlarmTime,
    pub label: String,
    pub repeat_days: RepeatDays,
}

impl NewAlarm {
    pub fn new(time: AlarmTime) -> Self {
        Self {
            time,
            label: String::new(),
            repeat_days: RepeatDays::none(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_repeat_days(mut self, repeat_days: RepeatDays) -> Self {
        self.repeat_days = repeat_days;
        self
    }

    pub(super) fn into_alarm(self, id: AlarmId) -> Alarm {
        Alarm {
            id,
            time: self.time,
            is_enabled: true,
            label: self.label,
            repeat_days: self.repeat_days,
        }
    }
}

/// Change published by the store after each successful list mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmEvent {
    Added(Alarm),
    Toggled { id: AlarmId, is_enabled: bool },
    Deleted(AlarmId),
}
