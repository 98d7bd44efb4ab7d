mod alarm_storage;

pub use alarm_storage::{AlarmStorage, InMemoryAlarmStorage};
