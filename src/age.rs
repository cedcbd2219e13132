//! Age calculation
//!
//! Converts a birth date and a reference instant into a structured age.
//! Months use an average length of 30.44 days rather than calendar months.

use crate::types::AgeBreakdown;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Age of a baby born on `birth_date` at the instant `now`.
///
/// The birth date is taken as midnight UTC. A birth date after `now` yields the
/// age by magnitude; rejecting it is left to the caller.
pub fn compute_age(birth_date: NaiveDate, now: DateTime<Utc>) -> AgeBreakdown {
    let birth = birth_date.and_time(NaiveTime::MIN).and_utc();
    compute_age_between(birth, now)
}

/// Age between two instants, by magnitude
pub fn compute_age_between(birth: DateTime<Utc>, now: DateTime<Utc>) -> AgeBreakdown {
    let elapsed_seconds = (now - birth).num_seconds().unsigned_abs();
    let days = elapsed_seconds / SECONDS_PER_DAY as u64;
    AgeBreakdown::from_days(u32::try_from(days).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_same_day_is_zero() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let birth = today.and_time(NaiveTime::MIN).and_utc();
        assert_eq!(compute_age_between(birth, birth), AgeBreakdown::default());
        // 14.5 hours after midnight is still day zero
        assert_eq!(compute_age(today, now()), AgeBreakdown::default());
    }

    #[test]
    fn test_two_hundred_days() {
        let birth = now() - Duration::days(200);
        let age = compute_age_between(birth, now());
        assert_eq!(age, AgeBreakdown { days: 200, weeks: 28, months: 6 });
    }

    #[test]
    fn test_partial_day_is_floored() {
        let birth = now() - Duration::days(6) - Duration::hours(23);
        let age = compute_age_between(birth, now());
        assert_eq!(age.days, 6);
        assert_eq!(age.weeks, 0);
    }

    #[test]
    fn test_future_birth_date_uses_magnitude() {
        let birth = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let age = compute_age(birth, now);
        assert_eq!(age, AgeBreakdown { days: 30, weeks: 4, months: 0 });
    }

    #[test]
    fn test_birth_date_is_utc_midnight() {
        let birth = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let just_before = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let on_boundary = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(compute_age(birth, just_before).days, 30);
        assert_eq!(compute_age(birth, on_boundary).days, 31);
        assert_eq!(compute_age(birth, on_boundary).months, 1);
    }

    proptest! {
        #[test]
        fn prop_weeks_are_days_div_seven(offset_secs in -2_000_000_000i64..2_000_000_000i64) {
            let birth = now() + Duration::seconds(offset_secs);
            let age = compute_age_between(birth, now());
            prop_assert_eq!(age.weeks, age.days / 7);
            prop_assert_eq!(age.months, (age.days as f64 / 30.44).floor() as u32);
        }

        #[test]
        fn prop_age_is_symmetric(offset_secs in 0i64..2_000_000_000i64) {
            let earlier = now() - Duration::seconds(offset_secs);
            prop_assert_eq!(
                compute_age_between(earlier, now()),
                compute_age_between(now(), earlier)
            );
        }
    }
}
