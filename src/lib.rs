pub mod alarm;
pub mod alarm_clock;
pub mod appsettings;
pub mod countdown;
pub mod form;
pub mod log_channel;
pub mod next_occurrence;
pub mod ringer;
pub mod storage;
pub mod wall_clock;
pub mod weekday;

pub use chrono;
pub use chrono_tz;
