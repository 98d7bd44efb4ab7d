//! Conversion between the alarm's day numbering (0 = Sunday .. 6 = Saturday)
//! and [`chrono::Weekday`].

use chrono::Weekday;

/// Indexed by the alarm day number.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn from_index(index: u8) -> Option<Weekday> {
    WEEKDAYS.get(usize::from(index)).copied()
}

pub fn to_index(weekday: Weekday) -> u8 {
    let position = WEEKDAYS
        .iter()
        .position(|day| *day == weekday)
        .expect("The table covers every weekday.");

    position as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunday_is_zero_and_saturday_is_six() {
        assert_eq!(from_index(0), Some(Weekday::Sun));
        assert_eq!(from_index(1), Some(Weekday::Mon));
        assert_eq!(from_index(6), Some(Weekday::Sat));
        assert_eq!(to_index(Weekday::Sun), 0);
        assert_eq!(to_index(Weekday::Sat), 6);
    }

    #[test]
    fn out_of_range_index_has_no_weekday() {
        assert_eq!(from_index(7), None);
        assert_eq!(from_index(u8::MAX), None);
    }

    #[test]
    fn table_agrees_with_chrono_numbering() {
        for index in 0..7u8 {
            let weekday = from_index(index).unwrap();
            assert_eq!(weekday.num_days_from_sunday(), u32::from(index));
            assert_eq!(to_index(weekday), index);
        }
    }
}
