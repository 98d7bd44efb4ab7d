mod delivery;
mod tokio_ringer;

use std::time::Duration;

use async_trait::async_trait;

use crate::alarm::{Alarm, AlarmId};

pub use delivery::{WakeUpChannel, WakeUpMessage};
pub use tokio_ringer::TokioAlarmRinger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedAlarm {
    pub id: AlarmId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingerConfig {
    /// Pause between announcements of a ringing alarm.
    pub ring_interval: Duration,
    /// Announcements after the first one before the alarm counts as missed.
    pub ring_attempts: u8,
}

impl Default for RingerConfig {
    fn default() -> Self {
        Self {
            ring_interval: Duration::from_secs(30),
            ring_attempts: 10,
        }
    }
}

#[async_trait]
pub trait AlarmRinger: Send + Sync + 'static {
    async fn arm(&self, alarm: Alarm) -> anyhow::Result<ArmedAlarm>;

    async fn disarm(&self, armed_alarm: &ArmedAlarm) -> anyhow::Result<()>;

    async fn snooze(&self, armed_alarm: &ArmedAlarm) -> anyhow::Result<()>;

    async fn dismiss(&self, armed_alarm: &ArmedAlarm) -> anyhow::Result<()>;
}
