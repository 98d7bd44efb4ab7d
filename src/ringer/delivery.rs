use async_trait::async_trait;

use crate::alarm::Alarm;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WakeUpMessage {
    Armed,
    Ringing,
    Snoozed,
    Dismissed,
    Missed,
    Disarmed,
}

/// Where wake-up notifications end up: a speaker, a notification, a log.
#[async_trait]
pub trait WakeUpChannel: Send + Sync + 'static {
    async fn deliver(&self, alarm: &Alarm, message: WakeUpMessage) -> anyhow::Result<()>;
}
