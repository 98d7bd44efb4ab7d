use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone};

use crate::{
    alarm::{Alarm, AlarmError, AlarmTime, NewAlarm, RepeatDays, SnoozeDuration},
    countdown::CountdownPhrases,
    next_occurrence,
};

pub const DEFAULT_LABEL: &str = "Alarme";

/// Raw fields of the alarm configuration form, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmForm {
    pub hour: String,
    pub minute: String,
    pub period: String,
    pub days: BTreeSet<u8>,
    pub label: String,
    pub snooze: String,
    pub vibration: bool,
}

impl AlarmForm {
    pub fn new(hour: impl Into<String>, minute: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            hour: hour.into(),
            minute: minute.into(),
            period: period.into(),
            days: BTreeSet::new(),
            label: String::new(),
            snooze: SnoozeDuration::default().to_string(),
            vibration: true,
        }
    }

    /// A blank form preset to the current wall-clock time.
    pub fn starting_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let time = AlarmTime::from_wall_clock(now.time());
        Self::new(
            format!("{:02}", time.hour()),
            format!("{:02}", time.minute()),
            time.meridiem().to_string(),
        )
    }

    /// Prefills the form for editing an existing alarm.
    pub fn from_alarm(alarm: &Alarm) -> Self {
        Self {
            hour: format!("{:02}", alarm.time.hour()),
            minute: format!("{:02}", alarm.time.minute()),
            period: alarm.time.meridiem().to_string(),
            days: alarm.repeat_days.indices().collect(),
            label: alarm.label.clone(),
            snooze: alarm.snooze.to_string(),
            vibration: alarm.vibration,
        }
    }

    pub fn with_days(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.days = days.into_iter().collect();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_snooze(mut self, snooze: impl Into<String>) -> Self {
        self.snooze = snooze.into();
        self
    }

    pub fn with_vibration(mut self, vibration: bool) -> Self {
        self.vibration = vibration;
        self
    }

    pub fn validate(&self) -> Result<NewAlarm, AlarmError> {
        let time = AlarmTime::parse(&self.hour, &self.minute, &self.period)?;
        let repeat_days = RepeatDays::from_indices(self.days.iter().copied())?;
        let snooze = self.snooze.parse()?;
        let label = match self.label.trim() {
            "" => DEFAULT_LABEL.to_string(),
            label => label.to_string(),
        };

        Ok(NewAlarm {
            time,
            label,
            enabled: true,
            repeat_days,
            snooze,
            vibration: self.vibration,
        })
    }

    /// Next occurrence of the alarm as currently typed, `None` while the
    /// time fields do not parse.
    pub fn next_occurrence<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        next_occurrence::next_alarm_time(&self.hour, &self.minute, &self.period, &self.days, now)
    }

    /// Countdown preview shown under the form while editing.
    pub fn countdown<Tz: TimeZone>(&self, now: &DateTime<Tz>, phrases: &CountdownPhrases) -> String {
        phrases.until(self.next_occurrence(now).as_ref(), now)
    }
}
