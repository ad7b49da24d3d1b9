use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::{
    alarm::{AlarmTime, RepeatDays},
    gateway::NotificationContent,
    scheduling::{LocalSchedulerOptions, RepeatPolicy},
    storage::NewAlarm,
};

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct SchedulerSettings {
    pub timezone: String,
    pub repeat_policy: RepeatPolicy,
    pub authorized: bool,
    pub cancel_timeout_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_owned(),
            repeat_policy: RepeatPolicy::default(),
            authorized: true,
            cancel_timeout_secs: 5,
            cleanup_interval_secs: 300,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AlarmSettings {
    pub time: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub repeat_days: Vec<u8>,
}

impl AlarmSettings {
    pub fn to_new_alarm(&self) -> anyhow::Result<NewAlarm> {
        let time: AlarmTime = self.time.parse()?;
        let repeat_days = RepeatDays::from_indices(self.repeat_days.iter().copied())?;

        Ok(NewAlarm::new(time)
            .with_label(self.label.clone())
            .with_repeat_days(repeat_days))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct AppSettings {
    pub notification: NotificationContent,
    pub scheduler: SchedulerSettings,
    pub alarms: Vec<AlarmSettings>,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("appsettings").required(false))
                .add_source(File::with_name("appsettings.local").required(false))
                .add_source(
                    Environment::with_prefix("APP")
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )
    }

    fn from_config(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        let name = &self.scheduler.timezone;
        name.parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown time zone {name:?}: {e}"))
    }

    pub fn scheduler_options(&self) -> anyhow::Result<LocalSchedulerOptions> {
        Ok(LocalSchedulerOptions {
            timezone: self.timezone()?,
            repeat_policy: self.scheduler.repeat_policy,
            authorized: self.scheduler.authorized,
            cancel_timeout: Duration::from_secs(self.scheduler.cancel_timeout_secs),
            cleanup_interval: Duration::from_secs(self.scheduler.cleanup_interval_secs),
            content: self.notification.clone(),
        })
    }

    pub fn seed_alarms(&self) -> anyhow::Result<Vec<NewAlarm>> {
        self.alarms
            .iter()
            .enumerate()
            .map(|(index, alarm)| {
                alarm
                    .to_new_alarm()
                    .with_context(|| format!("Invalid alarm #{index} in settings"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> AppSettings {
        AppSettings::from_config(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
        .unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let settings = from_toml("");

        assert_eq!(settings.notification.title, "Alarm");
        assert_eq!(settings.scheduler.repeat_policy, RepeatPolicy::Daily);
        assert_eq!(settings.timezone().unwrap(), Tz::UTC);
        assert!(settings.alarms.is_empty());
    }

    #[test]
    fn full_config_is_parsed() {
        let settings = from_toml(
            r#"
            [notification]
            title = "Budilnik"
            default_body = "Get up"

            [scheduler]
            timezone = "Europe/Berlin"
            repeat_policy = "selected_days"
            cancel_timeout_secs = 2

            [[alarms]]
            time = "07:30"
            label = "Work"
            repeat_days = [1, 2, 3, 4, 5]

            [[alarms]]
            time = "9:00 AM"
            "#,
        );

        let options = settings.scheduler_options().unwrap();
        assert_eq!(options.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(options.repeat_policy, RepeatPolicy::SelectedDays);
        assert_eq!(options.cancel_timeout, Duration::from_secs(2));
        assert_eq!(options.content.default_body, "Get up");

        let alarms = settings.seed_alarms().unwrap();
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].label, "Work");
        assert_eq!(alarms[0].repeat_days.len(), 5);
        assert_eq!(alarms[1].time, AlarmTime::from_hm(9, 0).unwrap());
        assert!(alarms[1].repeat_days.is_empty());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        let settings = from_toml("[scheduler]\ntimezone = \"Mars/Olympus\"");

        assert!(settings.scheduler_options().is_err());
    }

    #[test]
    fn invalid_seed_alarm_is_reported() {
        let settings = from_toml("[[alarms]]\ntime = \"7:30\"\nrepeat_days = [9]");

        let error = settings.seed_alarms().unwrap_err();
        assert!(error.to_string().contains("#0"));
    }
}
