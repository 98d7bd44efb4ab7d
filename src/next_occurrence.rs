//! Computes when an alarm rings next.
//!
//! Candidates are built as local wall-clock times in the time zone of `now`.
//! A candidate equal to `now` is already in the past: an alarm due this very
//! instant rings on its next qualifying day.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveTime, TimeDelta, TimeZone};

use crate::{
    alarm::{AlarmTime, RepeatDays},
    weekday,
};

/// Days after today that are still searched for a repeating alarm. Today is
/// searched as well, so the window spans eight days and today's weekday gets
/// a second chance a week later.
const SEARCH_WINDOW_DAYS: u64 = 7;

/// Form-level entry point: raw hour, minute and period strings plus day
/// numbers (0 = Sunday). Malformed fields yield `None`. Day numbers outside
/// 0..=6 never match, so a set made only of those yields `None` as well.
pub fn next_alarm_time<Tz: TimeZone>(
    hour: &str,
    minute: &str,
    period: &str,
    repeat_days: &BTreeSet<u8>,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let time = AlarmTime::parse(hour, minute, period).ok()?;

    if repeat_days.is_empty() {
        return next_one_shot(time.to_naive_time(), now);
    }

    let days = RepeatDays::from_weekdays(
        repeat_days
            .iter()
            .filter_map(|day| weekday::from_index(*day)),
    );
    next_repeating(time.to_naive_time(), &days, now)
}

pub fn next_occurrence<Tz: TimeZone>(
    time: &AlarmTime,
    repeat_days: &RepeatDays,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    if repeat_days.is_empty() {
        next_one_shot(time.to_naive_time(), now)
    } else {
        next_repeating(time.to_naive_time(), repeat_days, now)
    }
}

fn next_one_shot<Tz: TimeZone>(time: NaiveTime, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let timezone = now.timezone();
    let today = now.date_naive();

    let candidate = localize(&timezone, today, time)?;
    if candidate > *now {
        return Some(candidate);
    }

    localize(&timezone, today.succ_opt()?, time)
}

fn next_repeating<Tz: TimeZone>(
    time: NaiveTime,
    repeat_days: &RepeatDays,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let timezone = now.timezone();
    let today = now.date_naive();

    let next = (0..=SEARCH_WINDOW_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|date| repeat_days.contains(date.weekday()))
        .filter_map(|date| localize(&timezone, date, time))
        .find(|candidate| candidate > now);

    if next.is_none() {
        log::warn!(
            "No occurrence found within {} days. [time = {}, repeat_days = {:?}]",
            SEARCH_WINDOW_DAYS,
            time,
            repeat_days
        );
    }

    next
}

/// Resolves a local wall-clock time. A time repeated by a backward clock
/// change resolves to its first instant; a time skipped by a forward change
/// is pushed one hour later.
fn localize<Tz: TimeZone>(timezone: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    let local = date.and_time(time);
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
            timezone.from_local_datetime(&shifted).earliest()
        }
    }
}
