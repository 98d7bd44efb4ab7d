use std::{collections::BTreeSet, fmt, str::FromStr, time::Duration};

use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Weekday};
use thiserror::Error;

use crate::{next_occurrence, weekday};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlarmError {
    #[error("Hour must be a number between 1 and 12, got {0:?}")]
    InvalidHour(String),

    #[error("Minute must be a number between 0 and 59, got {0:?}")]
    InvalidMinute(String),

    #[error("Period must be AM or PM, got {0:?}")]
    InvalidMeridiem(String),

    #[error("Repeat day must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekday(u8),

    #[error("Unsupported snooze duration {0:?}")]
    InvalidSnooze(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmId(u64);

impl AlarmId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meridiem {
    Am,
    Pm,
}

impl FromStr for Meridiem {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("AM") {
            Ok(Meridiem::Am)
        } else if trimmed.eq_ignore_ascii_case("PM") {
            Ok(Meridiem::Pm)
        } else {
            Err(AlarmError::InvalidMeridiem(s.to_string()))
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("AM"),
            Meridiem::Pm => f.write_str("PM"),
        }
    }
}

/// Wall-clock time on a 12-hour dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
    meridiem: Meridiem,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8, meridiem: Meridiem) -> Result<Self, AlarmError> {
        if !(1..=12).contains(&hour) {
            return Err(AlarmError::InvalidHour(hour.to_string()));
        }
        if minute > 59 {
            return Err(AlarmError::InvalidMinute(minute.to_string()));
        }

        Ok(Self {
            hour,
            minute,
            meridiem,
        })
    }

    /// Parses the raw fields of the alarm form.
    pub fn parse(hour: &str, minute: &str, meridiem: &str) -> Result<Self, AlarmError> {
        let parsed_hour = hour
            .trim()
            .parse::<u8>()
            .map_err(|_| AlarmError::InvalidHour(hour.to_string()))?;
        let parsed_minute = minute
            .trim()
            .parse::<u8>()
            .map_err(|_| AlarmError::InvalidMinute(minute.to_string()))?;
        let meridiem = meridiem.parse()?;

        Self::new(parsed_hour, parsed_minute, meridiem).map_err(|error| match error {
            AlarmError::InvalidHour(_) => AlarmError::InvalidHour(hour.to_string()),
            AlarmError::InvalidMinute(_) => AlarmError::InvalidMinute(minute.to_string()),
            other => other,
        })
    }

    /// The 12-hour reading of a 24-hour wall-clock time. Seconds are dropped.
    pub fn from_wall_clock(time: NaiveTime) -> Self {
        let hour24 = time.hour();
        let hour = match hour24 {
            0 | 12 => 12,
            h => h % 12,
        };
        let meridiem = if hour24 < 12 { Meridiem::Am } else { Meridiem::Pm };

        Self {
            hour: hour as u8,
            minute: time.minute() as u8,
            meridiem,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    pub fn hour24(&self) -> u32 {
        let hour = u32::from(self.hour);
        match (self.meridiem, hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        }
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour24(), u32::from(self.minute), 0)
            .expect("Hour and minute are validated on construction.")
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02} {}", self.hour, self.minute, self.meridiem)
    }
}

/// Days of the week an alarm repeats on, kept as day numbers (0 = Sunday).
/// An empty set means the alarm rings once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatDays(BTreeSet<u8>);

impl RepeatDays {
    pub fn once() -> Self {
        Self::default()
    }

    pub fn every_day() -> Self {
        Self((0..7).collect())
    }

    pub fn weekdays() -> Self {
        Self((1..=5).collect())
    }

    pub fn from_weekdays(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self(days.into_iter().map(weekday::to_index).collect())
    }

    /// Rejects any day number outside 0..=6.
    pub fn from_indices(days: impl IntoIterator<Item = u8>) -> Result<Self, AlarmError> {
        let days = days
            .into_iter()
            .map(|day| match weekday::from_index(day) {
                Some(_) => Ok(day),
                None => Err(AlarmError::InvalidWeekday(day)),
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self(days))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&weekday::to_index(day))
    }

    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SnoozeDuration {
    #[default]
    FiveMinutes,
    TenMinutes,
    FifteenMinutes,
    TwentyMinutes,
    TwentyFiveMinutes,
    ThirtyMinutes,
}

impl SnoozeDuration {
    pub const ALL: [SnoozeDuration; 6] = [
        SnoozeDuration::FiveMinutes,
        SnoozeDuration::TenMinutes,
        SnoozeDuration::FifteenMinutes,
        SnoozeDuration::TwentyMinutes,
        SnoozeDuration::TwentyFiveMinutes,
        SnoozeDuration::ThirtyMinutes,
    ];

    pub fn minutes(&self) -> u64 {
        match self {
            SnoozeDuration::FiveMinutes => 5,
            SnoozeDuration::TenMinutes => 10,
            SnoozeDuration::FifteenMinutes => 15,
            SnoozeDuration::TwentyMinutes => 20,
            SnoozeDuration::TwentyFiveMinutes => 25,
            SnoozeDuration::ThirtyMinutes => 30,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }
}

impl fmt::Display for SnoozeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

impl FromStr for SnoozeDuration {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .into_iter()
            .find(|snooze| snooze.to_string() == label)
            .ok_or_else(|| AlarmError::InvalidSnooze(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: AlarmTime,
    pub label: String,
    pub enabled: bool,
    pub repeat_days: RepeatDays,
    pub snooze: SnoozeDuration,
    pub vibration: bool,
}

impl Alarm {
    pub fn is_one_shot(&self) -> bool {
        self.repeat_days.is_empty()
    }

    pub fn next_occurrence<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        next_occurrence::next_occurrence(&self.time, &self.repeat_days, now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub time: AlarmTime,
    pub label: String,
    pub enabled: bool,
    pub repeat_days: RepeatDays,
    pub snooze: SnoozeDuration,
    pub vibration: bool,
}

impl NewAlarm {
    pub fn new(time: AlarmTime, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
            enabled: true,
            repeat_days: RepeatDays::once(),
            snooze: SnoozeDuration::default(),
            vibration: true,
        }
    }

    pub(crate) fn into_alarm(self, id: AlarmId) -> Alarm {
        Alarm {
            id,
            time: self.time,
            label: self.label,
            enabled: self.enabled,
            repeat_days: self.repeat_days,
            snooze: self.snooze,
            vibration: self.vibration,
        }
    }
}
