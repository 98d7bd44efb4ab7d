//! Human readable "time until the alarm rings" text.

use chrono::{DateTime, TimeDelta, TimeZone};
use serde::Deserialize;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CountdownPhrases {
    pub lead_in: String,
    pub under_a_minute: String,
}

impl Default for CountdownPhrases {
    fn default() -> Self {
        Self {
            lead_in: "Toca em".to_string(),
            under_a_minute: "menos de um minuto".to_string(),
        }
    }
}

impl CountdownPhrases {
    /// Renders `remaining` rounded up to the next whole minute, e.g.
    /// `Toca em 1d 2h 3min`. An absent or negative duration renders as an
    /// empty string.
    pub fn format(&self, remaining: Option<TimeDelta>) -> String {
        let Some(remaining) = remaining else {
            return String::new();
        };
        if remaining < TimeDelta::zero() {
            return String::new();
        }

        let total_minutes = whole_minutes_rounded_up(remaining);
        if total_minutes == 0 {
            return format!("{} {}", self.lead_in, self.under_a_minute);
        }

        let days = total_minutes / MINUTES_PER_DAY;
        let hours = total_minutes % MINUTES_PER_DAY / MINUTES_PER_HOUR;
        let minutes = total_minutes % MINUTES_PER_HOUR;

        let mut parts = Vec::with_capacity(3);
        if days > 0 {
            parts.push(format!("{days}d"));
        }
        if hours > 0 {
            parts.push(format!("{hours}h"));
        }
        if minutes > 0 {
            parts.push(format!("{minutes}min"));
        }

        format!("{} {}", self.lead_in, parts.join(" "))
    }

    pub fn until<Tz: TimeZone>(&self, next: Option<&DateTime<Tz>>, now: &DateTime<Tz>) -> String {
        self.format(next.map(|next| next.clone() - now.clone()))
    }
}

/// Formats with the default phrases.
pub fn format_duration(remaining: Option<TimeDelta>) -> String {
    CountdownPhrases::default().format(remaining)
}

fn whole_minutes_rounded_up(remaining: TimeDelta) -> i64 {
    let mut seconds = remaining.num_seconds();
    if remaining.subsec_nanos() > 0 {
        seconds += 1;
    }

    (seconds + 59) / 60
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn absent_duration_renders_nothing() {
        assert_eq!(format_duration(None), "");
    }

    #[test]
    fn negative_duration_renders_nothing() {
        assert_eq!(format_duration(Some(TimeDelta::seconds(-1))), "");
        assert_eq!(format_duration(Some(TimeDelta::days(-3))), "");
    }

    #[test]
    fn zero_duration_renders_under_a_minute_phrase() {
        assert_eq!(
            format_duration(Some(TimeDelta::zero())),
            "Toca em menos de um minuto"
        );
    }

    #[test]
    fn partial_minutes_round_up() {
        assert_eq!(format_duration(Some(TimeDelta::seconds(10))), "Toca em 1min");
        assert_eq!(format_duration(Some(TimeDelta::milliseconds(1))), "Toca em 1min");
        assert_eq!(format_duration(Some(TimeDelta::seconds(60))), "Toca em 1min");
        assert_eq!(format_duration(Some(TimeDelta::seconds(61))), "Toca em 2min");
        assert_eq!(
            format_duration(Some(TimeDelta::minutes(59) + TimeDelta::seconds(30))),
            "Toca em 1h"
        );
    }

    #[test]
    fn ninety_minutes() {
        assert_eq!(
            format_duration(Some(TimeDelta::minutes(90))),
            "Toca em 1h 30min"
        );
    }

    #[test]
    fn zero_units_are_skipped() {
        assert_eq!(format_duration(Some(TimeDelta::days(1))), "Toca em 1d");
        assert_eq!(
            format_duration(Some(TimeDelta::days(2) + TimeDelta::minutes(5))),
            "Toca em 2d 5min"
        );
        assert_eq!(
            format_duration(Some(
                TimeDelta::days(1) + TimeDelta::hours(2) + TimeDelta::minutes(3)
            )),
            "Toca em 1d 2h 3min"
        );
    }

    #[test]
    fn custom_phrases() {
        let phrases = CountdownPhrases {
            lead_in: "Rings in".to_string(),
            under_a_minute: "less than a minute".to_string(),
        };

        assert_eq!(phrases.format(Some(TimeDelta::minutes(90))), "Rings in 1h 30min");
        assert_eq!(phrases.format(Some(TimeDelta::zero())), "Rings in less than a minute");
    }

    #[test]
    fn until_measures_from_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2025, 6, 3, 6, 0, 0).unwrap();
        let phrases = CountdownPhrases::default();

        assert_eq!(phrases.until(Some(&next), &now), "Toca em 21h");
        assert_eq!(phrases.until(None, &now), "");
    }
}
