use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike, Weekday};
use thiserror::Error;

pub type AlarmId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlarmError {
    #[error("Invalid alarm time {0:?}, expected HH:MM or hh:mm AM/PM")]
    InvalidTime(String),

    #[error("Weekday index {0} is out of range, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),
}

/// Wall-clock time of day an alarm fires at. Only hour and minute are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Zero is always a valid second and nanosecond.");
        Self(normalized_time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%I:%M %p"))
    }
}

impl FromStr for AlarmTime {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ["%H:%M", "%I:%M %p", "%I:%M%p"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
            .map(Self::new)
            .ok_or_else(|| AlarmError::InvalidTime(s.to_owned()))
    }
}

/// Weekdays an alarm repeats on. Empty means the alarm fires once.
///
/// Stored as a bitmask indexed by days from Sunday, so 0 is Sunday and 6 is Saturday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RepeatDays(u8);

impl RepeatDays {
    pub fn none() -> Self {
        Self(0)
    }

    pub fn every_day() -> Self {
        Self(0b0111_1111)
    }

    pub fn from_indices(indices: impl IntoIterator<Item = u8>) -> Result<Self, AlarmError> {
        indices.into_iter().try_fold(Self::none(), |days, index| {
            if index > 6 {
                return Err(AlarmError::InvalidWeekday(index));
            }
            Ok(Self(days.0 | 1 << index))
        })
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_sunday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Selected days in Sunday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        SUNDAY_FIRST.into_iter().filter(|day| self.contains(*day))
    }

    pub fn indices(&self) -> Vec<u8> {
        self.iter()
            .map(|day| day.num_days_from_sunday() as u8)
            .collect()
    }
}

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

impl FromIterator<Weekday> for RepeatDays {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut days = Self::none();
        for day in iter {
            days.insert(day);
        }
        days
    }
}

impl fmt::Display for RepeatDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Once");
        }
        let names: Vec<String> = self.iter().map(|day| day.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: AlarmTime,
    pub is_enabled: bool,
    pub label: String,
    pub repeat_days: RepeatDays,
}

impl Alarm {
    pub fn time_string(&self) -> String {
        self.time.to_string()
    }

    pub fn repeats(&self) -> bool {
        !self.repeat_days.is_empty()
    }
}
