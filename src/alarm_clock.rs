use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    alarm::{Alarm, AlarmId, NewAlarm},
    countdown::CountdownPhrases,
    form::AlarmForm,
    ringer::{AlarmRinger, ArmedAlarm, WakeUpChannel, WakeUpMessage},
    storage::AlarmStorage,
};

/// Keeps stored alarms and armed alarms in step.
pub struct AlarmClock {
    storage: Arc<dyn AlarmStorage>,
    ringer: Arc<dyn AlarmRinger>,
    timezone: Tz,
    phrases: CountdownPhrases,
}

impl AlarmClock {
    pub fn new(
        storage: Arc<dyn AlarmStorage>,
        ringer: Arc<dyn AlarmRinger>,
        timezone: Tz,
        phrases: CountdownPhrases,
    ) -> Self {
        Self {
            storage,
            ringer,
            timezone,
            phrases,
        }
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub fn phrases(&self) -> &CountdownPhrases {
        &self.phrases
    }

    pub async fn add(&self, new_alarm: NewAlarm) -> anyhow::Result<Alarm> {
        let alarm = self.storage.insert(new_alarm).await?;
        log::info!("Created alarm {} \"{}\" at {}", alarm.id, alarm.label, alarm.time);

        if alarm.enabled {
            self.ringer.arm(alarm.clone()).await?;
        }

        Ok(alarm)
    }

    pub async fn create(&self, form: &AlarmForm) -> anyhow::Result<Alarm> {
        let new_alarm = form.validate()?;
        self.add(new_alarm).await
    }

    /// Applies the form to an existing alarm. The enabled flag is kept and the
    /// label is stored as typed, without the default for blank labels.
    pub async fn edit(&self, id: AlarmId, form: &AlarmForm) -> anyhow::Result<Alarm> {
        let current = self.get(id).await?;
        let NewAlarm {
            time,
            repeat_days,
            snooze,
            vibration,
            ..
        } = form.validate()?;

        let alarm = self
            .storage
            .update(Alarm {
                id,
                time,
                label: form.label.clone(),
                enabled: current.enabled,
                repeat_days,
                snooze,
                vibration,
            })
            .await?;
        log::info!("Edited alarm {}", id);

        self.rearm(&alarm).await?;
        Ok(alarm)
    }

    pub async fn set_enabled(&self, id: AlarmId, enabled: bool) -> anyhow::Result<Alarm> {
        let mut alarm = self.get(id).await?;
        alarm.enabled = enabled;
        let alarm = self.storage.update(alarm).await?;
        log::info!("Alarm {} enabled = {}", id, enabled);

        self.rearm(&alarm).await?;
        Ok(alarm)
    }

    pub async fn delete(&self, id: AlarmId) -> anyhow::Result<Alarm> {
        let alarm = self.storage.delete(id).await?;
        self.disarm_if_armed(id).await;
        log::info!("Deleted alarm {}", id);

        Ok(alarm)
    }

    pub async fn alarms(&self) -> Vec<Alarm> {
        self.storage.get_all().await
    }

    pub async fn snooze(&self, id: AlarmId) -> anyhow::Result<()> {
        self.ringer.snooze(&ArmedAlarm { id }).await
    }

    pub async fn dismiss(&self, id: AlarmId) -> anyhow::Result<()> {
        self.ringer.dismiss(&ArmedAlarm { id }).await
    }

    pub async fn next_alarm(&self) -> Option<(Alarm, DateTime<Tz>)> {
        self.next_alarm_at(&self.now()).await
    }

    /// The enabled alarm that rings soonest after `now`.
    pub async fn next_alarm_at(&self, now: &DateTime<Tz>) -> Option<(Alarm, DateTime<Tz>)> {
        self.alarms()
            .await
            .into_iter()
            .filter(|alarm| alarm.enabled)
            .filter_map(|alarm| {
                let next = alarm.next_occurrence(now)?;
                Some((alarm, next))
            })
            .min_by(|(_, left), (_, right)| left.cmp(right))
    }

    pub fn countdown(&self, alarm: &Alarm) -> String {
        self.countdown_at(alarm, &self.now())
    }

    pub fn countdown_at(&self, alarm: &Alarm, now: &DateTime<Tz>) -> String {
        self.phrases.until(alarm.next_occurrence(now).as_ref(), now)
    }

    /// Countdown for a form that is still being edited.
    pub fn preview(&self, form: &AlarmForm) -> String {
        form.countdown(&self.now(), &self.phrases)
    }

    async fn get(&self, id: AlarmId) -> anyhow::Result<Alarm> {
        self.storage
            .get(id)
            .await
            .ok_or_else(|| anyhow::anyhow!("Alarm {} does not exist", id))
    }

    async fn rearm(&self, alarm: &Alarm) -> anyhow::Result<()> {
        self.disarm_if_armed(alarm.id).await;
        if alarm.enabled {
            self.ringer.arm(alarm.clone()).await?;
        }

        Ok(())
    }

    async fn disarm_if_armed(&self, id: AlarmId) {
        if let Err(error) = self.ringer.disarm(&ArmedAlarm { id }).await {
            log::debug!("Nothing to disarm for alarm {}: {}", id, error);
        }
    }
}

/// Forwards wake-up messages, and turns a one-shot alarm off in storage once
/// it has been dismissed or missed. Its ringer task is gone at that point.
pub struct SyncedWakeUpChannel {
    storage: Arc<dyn AlarmStorage>,
    inner: Arc<dyn WakeUpChannel>,
}

impl SyncedWakeUpChannel {
    pub fn new(storage: Arc<dyn AlarmStorage>, inner: Arc<dyn WakeUpChannel>) -> Self {
        Self { storage, inner }
    }

    async fn turn_off(&self, id: AlarmId) -> anyhow::Result<()> {
        let Some(mut alarm) = self.storage.get(id).await else {
            return Ok(());
        };
        // Edited into a repeating alarm, or already off.
        if !alarm.is_one_shot() || !alarm.enabled {
            return Ok(());
        }

        alarm.enabled = false;
        self.storage.update(alarm).await?;
        log::info!("One-shot alarm {} turned off", id);

        Ok(())
    }
}

#[async_trait]
impl WakeUpChannel for SyncedWakeUpChannel {
    async fn deliver(&self, alarm: &Alarm, message: WakeUpMessage) -> anyhow::Result<()> {
        let turned_off = match message {
            WakeUpMessage::Dismissed | WakeUpMessage::Missed if alarm.is_one_shot() => {
                self.turn_off(alarm.id).await
            }
            _ => Ok(()),
        };

        self.inner.deliver(alarm, message).await?;
        turned_off
    }
}
