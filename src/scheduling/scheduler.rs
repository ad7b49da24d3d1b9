use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use serde::Deserialize;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{alarm::RepeatDays, gateway::NotificationRequest};

pub(crate) struct ScheduledTrigger {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTrigger {
    pub fn new(task_handle: JoinHandle<()>, cancellation_token: CancellationToken) -> Self {
        Self {
            task_handle,
            cancellation_token,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }

    pub async fn cancel(self, timeout: std::time::Duration) {
        self.cancellation_token.cancel();
        let cancel_with_timeout = time::timeout(timeout, self.task_handle);
        if cancel_with_timeout.await.is_err() {
            log::warn!("Trigger task did not stop within {:?}", timeout);
        }
    }
}

/// How a repeating trigger treats the weekdays selected on its alarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Fire every day at the alarm time, whatever days were selected.
    #[default]
    Daily,
    /// Fire only on the selected weekdays.
    SelectedDays,
}

impl RepeatPolicy {
    pub fn weekday_filter<'a>(&self, request: &'a NotificationRequest) -> Option<&'a RepeatDays> {
        match self {
            RepeatPolicy::SelectedDays if request.repeats => Some(&request.weekdays),
            _ => None,
        }
    }
}

// Two weeks plus slack, so a zone that skipped a whole calendar day still
// reaches the following week's selected day.
const SEARCH_DAYS: usize = 16;

/// Next moment strictly after `now` at which the local wall clock shows `fire_at`.
///
/// With a weekday filter only dates falling on a selected day qualify. Local
/// times skipped by a DST transition are moved forward by an hour. `None` only
/// when no such moment exists within the search window.
pub fn next_fire_at<Z: TimeZone>(
    fire_at: &NaiveTime,
    now: &DateTime<Z>,
    weekdays: Option<&RepeatDays>,
) -> Option<DateTime<Z>> {
    let timezone = now.timezone();
    let weekdays = weekdays.filter(|days| !days.is_empty());

    now.date_naive()
        .iter_days()
        .take(SEARCH_DAYS)
        .filter(|date| weekdays.is_none_or(|days| days.contains(date.weekday())))
        .filter_map(|date| resolve_local(&timezone, date.and_time(*fire_at)))
        .find(|candidate| candidate > now)
}

fn resolve_local<Z: TimeZone>(timezone: &Z, local: NaiveDateTime) -> Option<DateTime<Z>> {
    timezone.from_local_datetime(&local).earliest().or_else(|| {
        timezone
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
    })
}
