use std::{collections::BTreeSet, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{
    alarm::{AlarmError, NewAlarm},
    countdown::CountdownPhrases,
    form::AlarmForm,
    ringer::RingerConfig,
};

#[derive(Deserialize, Debug)]
pub struct ClockSettings {
    /// IANA time zone name, e.g. `America/Sao_Paulo`.
    pub timezone: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl ClockSettings {
    pub fn timezone(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown time zone {:?}", self.timezone))
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct RingerSettings {
    pub ring_interval_secs: u64,
    pub ring_attempts: u8,
}

impl Default for RingerSettings {
    fn default() -> Self {
        let defaults = RingerConfig::default();
        Self {
            ring_interval_secs: defaults.ring_interval.as_secs(),
            ring_attempts: defaults.ring_attempts,
        }
    }
}

impl RingerSettings {
    pub fn config(&self) -> RingerConfig {
        RingerConfig {
            ring_interval: Duration::from_secs(self.ring_interval_secs),
            ring_attempts: self.ring_attempts,
        }
    }
}

/// An alarm created at start-up, written in the shape of the alarm form.
#[derive(Deserialize, Debug, Clone)]
pub struct AlarmSeed {
    pub hour: String,
    pub minute: String,
    pub period: String,
    #[serde(default)]
    pub days: BTreeSet<u8>,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_snooze")]
    pub snooze: String,
    #[serde(default = "enabled_by_default")]
    pub vibration: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl AlarmSeed {
    pub fn form(&self) -> AlarmForm {
        AlarmForm::new(&self.hour, &self.minute, &self.period)
            .with_days(self.days.iter().copied())
            .with_label(&self.label)
            .with_snooze(&self.snooze)
            .with_vibration(self.vibration)
    }

    pub fn to_new_alarm(&self) -> Result<NewAlarm, AlarmError> {
        let mut new_alarm = self.form().validate()?;
        new_alarm.enabled = self.enabled;
        Ok(new_alarm)
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub clock: ClockSettings,
    #[serde(default)]
    pub ringer: RingerSettings,
    #[serde(default)]
    pub countdown: CountdownPhrases,
    #[serde(default)]
    pub alarms: Vec<AlarmSeed>,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_snooze() -> String {
    crate::alarm::SnoozeDuration::default().to_string()
}

fn enabled_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(toml: &str) -> AppSettings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_settings_use_defaults() {
        let settings = from_toml(
            r#"
            [clock]
            timezone = "America/Sao_Paulo"
            "#,
        );

        assert_eq!(settings.clock.timezone().unwrap(), chrono_tz::America::Sao_Paulo);
        assert_eq!(settings.clock.refresh_secs, 60);
        assert_eq!(settings.ringer.config(), RingerConfig::default());
        assert_eq!(settings.countdown, CountdownPhrases::default());
        assert!(settings.alarms.is_empty());
    }

    #[test]
    fn partial_ringer_section_keeps_other_defaults() {
        let settings = from_toml(
            r#"
            [clock]
            timezone = "UTC"

            [ringer]
            ring_attempts = 3
            "#,
        );

        let config = settings.ringer.config();
        assert_eq!(config.ring_attempts, 3);
        assert_eq!(config.ring_interval, RingerConfig::default().ring_interval);
    }

    #[test]
    fn unknown_time_zone_is_an_error() {
        let settings = from_toml(
            r#"
            [clock]
            timezone = "Mars/Olympus_Mons"
            "#,
        );

        assert!(settings.clock.timezone().is_err());
    }

    #[test]
    fn seeds_become_alarms() {
        let settings = from_toml(
            r#"
            [clock]
            timezone = "UTC"

            [ringer]
            ring_interval_secs = 10
            ring_attempts = 3

            [countdown]
            lead_in = "Rings in"

            [[alarms]]
            hour = "06"
            minute = "00"
            period = "AM"
            label = "Academia"
            days = [1, 2, 3, 4, 5]

            [[alarms]]
            hour = "08"
            minute = "30"
            period = "AM"
            label = "Trabalho"
            days = [0, 6]
            snooze = "10 min"
            enabled = false
            "#,
        );

        assert_eq!(settings.ringer.config().ring_interval, Duration::from_secs(10));
        assert_eq!(settings.countdown.lead_in, "Rings in");
        assert_eq!(settings.countdown.under_a_minute, CountdownPhrases::default().under_a_minute);

        let alarms: Vec<NewAlarm> = settings
            .alarms
            .iter()
            .map(|seed| seed.to_new_alarm().unwrap())
            .collect();
        assert_eq!(alarms.len(), 2);
        assert!(alarms[0].enabled);
        assert!(alarms[0].vibration);
        assert_eq!(alarms[0].repeat_days.indices().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(!alarms[1].enabled);
        assert_eq!(alarms[1].snooze.minutes(), 10);
    }

    #[test]
    fn invalid_seed_is_reported() {
        let seed = AlarmSeed {
            hour: "6".to_string(),
            minute: "00".to_string(),
            period: "AM".to_string(),
            days: [9].into_iter().collect(),
            label: String::new(),
            snooze: default_snooze(),
            vibration: true,
            enabled: true,
        };

        assert_eq!(seed.to_new_alarm(), Err(AlarmError::InvalidWeekday(9)));
    }
}
