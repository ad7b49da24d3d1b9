pub mod delivery;
mod local_scheduler;
mod scheduler;

pub use delivery::{AlertChannel, AlertKind, ConsoleAlertChannel};
pub use local_scheduler::{LocalAlarmScheduler, LocalSchedulerOptions};
pub use scheduler::{RepeatPolicy, next_fire_at};
