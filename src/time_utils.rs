use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;

/// The bot's home timezone. Quiet hours are evaluated against wall-clock
/// time here, regardless of what timezone `now` arrives in.
pub const HOME_TZ: Tz = Seoul;

/// Returns true if `now` falls inside the configured quiet window.
///
/// Hours are in [0, 23]. A zero-width window (`start == end`) means no
/// suppression. A window with `start > end` crosses midnight, e.g.
/// 23..8 suppresses 23:00-23:59 and 00:00-07:59.
pub fn in_quiet_hours(start: u32, end: u32, now: DateTime<Utc>) -> bool {
    let hour = now.with_timezone(&HOME_TZ).hour();

    if start == end {
        false
    } else if start < end {
        start <= hour && hour < end
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seoul_at(hour: u32, minute: u32) -> DateTime<Utc> {
        HOME_TZ
            .with_ymd_and_hms(2026, 3, 15, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn zero_width_window_never_suppresses() {
        for hour in 0..24 {
            assert!(!in_quiet_hours(9, 9, seoul_at(hour, 0)));
        }
    }

    #[test]
    fn same_day_window_is_half_open() {
        assert!(!in_quiet_hours(9, 17, seoul_at(8, 59)));
        assert!(in_quiet_hours(9, 17, seoul_at(9, 0)));
        assert!(in_quiet_hours(9, 17, seoul_at(16, 59)));
        assert!(!in_quiet_hours(9, 17, seoul_at(17, 0)));
    }

    #[test]
    fn window_crossing_midnight() {
        assert!(in_quiet_hours(23, 8, seoul_at(23, 0)));
        assert!(in_quiet_hours(23, 8, seoul_at(7, 59)));
        assert!(!in_quiet_hours(23, 8, seoul_at(8, 0)));
        assert!(!in_quiet_hours(23, 8, seoul_at(12, 0)));
    }

    #[test]
    fn input_timezone_does_not_matter() {
        // 23:30 in Seoul is 14:30 UTC; the window must be judged in Seoul.
        let utc_afternoon = Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap();
        assert!(in_quiet_hours(23, 8, utc_afternoon));
    }
}
