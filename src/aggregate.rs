//! Event aggregation
//!
//! Reduces raw feed and diaper records into day-scoped and all-time totals.
//!
//! A day window is `[local midnight, next local midnight)` in the caller's time
//! zone. Records count unless they are boolean-bearing with `happened == false`;
//! quantities of every in-window record are summed, with absent, negative and
//! non-finite quantities counting as zero.
//! Quantities are summed in sorted order so the result does not depend on the
//! order rows arrived in.

use crate::types::{DailyAggregate, DayWindow, EventRecord, TotalAggregate};
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Longest DST gap searched when local midnight does not exist
const MAX_GAP_STEPS: i64 = 4 * 24;
const GAP_STEP_MINUTES: i64 = 15;

/// Aggregator over uniform event records
pub struct EventAggregator;

impl EventAggregator {
    /// Aggregate the records of one local calendar day
    pub fn aggregate_day<Tz: TimeZone>(
        events: &[EventRecord],
        day: NaiveDate,
        tz: &Tz,
    ) -> DailyAggregate {
        Self::aggregate_window(events, day_window(day, tz))
    }

    /// Aggregate the local day containing `now`
    pub fn aggregate_today<Tz: TimeZone>(
        events: &[EventRecord],
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> DailyAggregate {
        Self::aggregate_day(events, local_date(now, tz), tz)
    }

    /// Aggregate the records inside an explicit window
    pub fn aggregate_window(events: &[EventRecord], window: DayWindow) -> DailyAggregate {
        let (event_count, quantity_total) =
            tally(events.iter().filter(|e| window.contains(&e.occurred_at)));

        DailyAggregate {
            window_start: window.start,
            window_end: window.end,
            event_count,
            quantity_total,
        }
    }

    /// Aggregate the whole history
    pub fn aggregate_all(events: &[EventRecord]) -> TotalAggregate {
        let (count, quantity_total) = tally(events.iter());
        TotalAggregate {
            count,
            quantity_total,
        }
    }

    /// One aggregate per local day for the `days` days ending at `last_day`,
    /// oldest first
    pub fn daily_series<Tz: TimeZone>(
        events: &[EventRecord],
        last_day: NaiveDate,
        days: u32,
        tz: &Tz,
    ) -> Vec<DailyAggregate> {
        (0..days)
            .rev()
            .filter_map(|offset| last_day.checked_sub_days(Days::new(offset as u64)))
            .map(|day| Self::aggregate_day(events, day, tz))
            .collect()
    }
}

/// Calendar date of `instant` in `tz`
pub fn local_date<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Half-open window covering the local calendar day `day`
pub fn day_window<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DayWindow {
    let start = local_midnight(day, tz);
    let end = day
        .succ_opt()
        .map(|next| local_midnight(next, tz))
        .unwrap_or(start);

    DayWindow { start, end }
}

/// First instant of `day` in `tz`.
///
/// Ambiguous midnights resolve to the earlier instant. When midnight falls in a
/// DST gap, the first valid local time after it is used.
fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);

    (0..=MAX_GAP_STEPS)
        .map(|step| midnight + Duration::minutes(step * GAP_STEP_MINUTES))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|resolved| resolved.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Count and quantity total of a set of records
fn tally<'a>(events: impl Iterator<Item = &'a EventRecord>) -> (u32, f64) {
    let mut count: u32 = 0;
    let mut quantities: Vec<f64> = Vec::new();

    for event in events {
        if event.is_counted() {
            count = count.saturating_add(1);
        }
        quantities.push(event.quantity_or_zero());
    }

    (count, canonical_sum(quantities))
}

/// Sum in ascending order so the result is independent of input order
fn canonical_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().fold(0.0, |acc, v| acc + v)
}
