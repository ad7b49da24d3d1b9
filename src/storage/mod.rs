mod alarm_store;
mod model;

pub use alarm_store::AlarmStore;
pub use model::{AlarmEvent, NewAlarm};
