use async_trait::async_trait;

use crate::{
    alarm::Alarm,
    ringer::{WakeUpChannel, WakeUpMessage},
};

/// Writes wake-up notifications to the log.
pub struct LogWakeUpChannel;

#[async_trait]
impl WakeUpChannel for LogWakeUpChannel {
    async fn deliver(&self, alarm: &Alarm, message: WakeUpMessage) -> anyhow::Result<()> {
        let text = get_message_text(alarm, message);
        match message {
            WakeUpMessage::Ringing => log::warn!("{}", text),
            _ => log::info!("{}", text),
        }

        Ok(())
    }
}

fn get_message_text(alarm: &Alarm, message: WakeUpMessage) -> String {
    match message {
        WakeUpMessage::Armed => format!("⏱️: {} set for {}", alarm.label, alarm.time),
        WakeUpMessage::Ringing if alarm.vibration => {
            format!("🚨 {} {} (vibrating)", alarm.time, alarm.label.to_uppercase())
        }
        WakeUpMessage::Ringing => format!("🚨 {} {}", alarm.time, alarm.label.to_uppercase()),
        WakeUpMessage::Snoozed => format!("💤: {} snoozed for {}", alarm.label, alarm.snooze),
        WakeUpMessage::Dismissed => format!("✅: {} dismissed", alarm.label),
        WakeUpMessage::Missed => format!("No reaction to {}! Stopping.", alarm.label),
        WakeUpMessage::Disarmed => format!("❌: {} turned off", alarm.label),
    }
}
