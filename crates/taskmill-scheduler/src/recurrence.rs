//! Pure recurrence arithmetic.
//!
//! Computes the next occurrence of a rule from the current occurrence,
//! with month-length and leap-day clamping and end-date termination.
//! No I/O, fully deterministic.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use taskmill_store::{Frequency, RecurrenceRule};

/// Compute the next occurrence after `current`, or `None` when the rule's
/// end date has been passed and the series is over. The caller must then
/// retire the rule.
///
/// - Daily adds `interval` days; weekly adds `interval` weeks. A weekly
///   rule's stored `days_of_week` set does not influence the arithmetic;
///   that matches the behavior this engine inherits, and which weekday a
///   multi-day rule should land on is deliberately left unspecified.
/// - Monthly moves `interval` months forward and lands on `day_of_month`
///   (or the current day), clamped to the target month's last day.
/// - Yearly moves `interval` years forward, clamping Feb 29 to Feb 28 in
///   non-leap years.
///
/// The time of day is preserved in every case.
pub fn next_occurrence(rule: &RecurrenceRule, current: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let next = match rule.frequency {
        Frequency::Daily => current + chrono::Duration::days(i64::from(rule.interval)),
        Frequency::Weekly => current + chrono::Duration::weeks(i64::from(rule.interval)),
        Frequency::Monthly => {
            let months = i64::from(current.month0()) + i64::from(rule.interval);
            let year = current.year() + (months / 12) as i32;
            let month = (months % 12) as u32 + 1;

            let target_day = rule
                .day_of_month
                .map(u32::from)
                .unwrap_or_else(|| current.day());
            let day = target_day.min(days_in_month(year, month));

            NaiveDate::from_ymd_opt(year, month, day)?
                .and_time(current.time())
                .and_utc()
        }
        Frequency::Yearly => {
            let year = current.year() + rule.interval as i32;
            let day = current.day().min(days_in_month(year, current.month()));

            NaiveDate::from_ymd_opt(year, current.month(), day)?
                .and_time(current.time())
                .and_utc()
        }
    };

    match rule.end_date {
        Some(end_date) if next.date_naive() > end_date => None,
        _ => Some(next),
    }
}

/// Number of days in the given month.
fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;
    use uuid::Uuid;

    fn rule(frequency: Frequency, interval: u32) -> RecurrenceRule {
        RecurrenceRule::new(Uuid::new_v4(), frequency, interval, Utc::now()).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    // === Unit tests ===

    #[test]
    fn test_daily_adds_interval_days() {
        let next = next_occurrence(&rule(Frequency::Daily, 3), at(2026, 3, 10, 9)).unwrap();
        assert_eq!(next, at(2026, 3, 13, 9));
    }

    #[test]
    fn test_weekly_adds_interval_weeks() {
        let next = next_occurrence(&rule(Frequency::Weekly, 2), at(2026, 3, 10, 9)).unwrap();
        assert_eq!(next, at(2026, 3, 24, 9));
    }

    #[test]
    fn test_weekly_ignores_days_of_week() {
        // The stored weekday set does not change the arithmetic.
        let plain = rule(Frequency::Weekly, 1);
        let constrained = rule(Frequency::Weekly, 1)
            .with_days_of_week(vec![0, 2, 4])
            .unwrap();

        let current = at(2026, 3, 10, 9);
        assert_eq!(
            next_occurrence(&plain, current),
            next_occurrence(&constrained, current)
        );
    }

    #[test]
    fn test_monthly_clamps_jan_31_to_feb_28() {
        // Scenario: Jan 31 + 1 month in a non-leap year
        let next = next_occurrence(&rule(Frequency::Monthly, 1), at(2026, 1, 31, 9)).unwrap();
        assert_eq!(next, at(2026, 2, 28, 9));
    }

    #[test]
    fn test_monthly_clamps_to_feb_29_in_leap_year() {
        let next = next_occurrence(&rule(Frequency::Monthly, 1), at(2028, 1, 31, 9)).unwrap();
        assert_eq!(next, at(2028, 2, 29, 9));
    }

    #[test_case(2026, 1, 15, 1, 2026, 2, 15 ; "mid month is untouched")]
    #[test_case(2026, 3, 31, 1, 2026, 4, 30 ; "march 31 clamps to april 30")]
    #[test_case(2026, 11, 30, 2, 2027, 1, 30 ; "interval crosses a year boundary")]
    #[test_case(2026, 12, 31, 12, 2027, 12, 31 ; "twelve months lands a year out")]
    fn test_monthly_arithmetic(
        y: i32,
        m: u32,
        d: u32,
        interval: u32,
        ey: i32,
        em: u32,
        ed: u32,
    ) {
        let next = next_occurrence(&rule(Frequency::Monthly, interval), at(y, m, d, 6)).unwrap();
        assert_eq!(next, at(ey, em, ed, 6));
    }

    #[test]
    fn test_monthly_uses_day_of_month_when_set() {
        let pinned = rule(Frequency::Monthly, 1).with_day_of_month(31).unwrap();
        // Current day is the 5th, but the rule is pinned to the 31st
        let next = next_occurrence(&pinned, at(2026, 3, 5, 9)).unwrap();
        assert_eq!(next, at(2026, 4, 30, 9));
    }

    #[test]
    fn test_yearly_keeps_month_and_day() {
        let next = next_occurrence(&rule(Frequency::Yearly, 1), at(2026, 7, 4, 12)).unwrap();
        assert_eq!(next, at(2027, 7, 4, 12));
    }

    #[test]
    fn test_yearly_clamps_leap_day() {
        let next = next_occurrence(&rule(Frequency::Yearly, 1), at(2028, 2, 29, 8)).unwrap();
        assert_eq!(next, at(2029, 2, 28, 8));
    }

    #[test]
    fn test_yearly_leap_to_leap_keeps_feb_29() {
        let next = next_occurrence(&rule(Frequency::Yearly, 4), at(2028, 2, 29, 8)).unwrap();
        assert_eq!(next, at(2032, 2, 29, 8));
    }

    #[test]
    fn test_end_date_terminates_series() {
        // Scenario: daily rule whose last occurrence fell on the end date
        let ended = rule(Frequency::Daily, 1)
            .with_end_date(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(next_occurrence(&ended, at(2026, 1, 31, 0)), None);
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let ending = rule(Frequency::Daily, 1)
            .with_end_date(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        // Next occurrence lands exactly on the end date: still allowed
        let next = next_occurrence(&ending, at(2026, 1, 30, 10)).unwrap();
        assert_eq!(next, at(2026, 1, 31, 10));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2026, 1), 31);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2028, 2), 29);
        assert_eq!(days_in_month(2026, 4), 30);
        assert_eq!(days_in_month(2026, 12), 31);
    }

    // === Property-based tests ===

    fn arb_current() -> impl Strategy<Value = DateTime<Utc>> {
        // 1970..2100, whole seconds
        (0i64..4_102_444_800).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
    }

    proptest! {
        #[test]
        fn daily_delta_is_exactly_interval_days(
            current in arb_current(),
            interval in 1u32..=365,
        ) {
            let next = next_occurrence(&rule(Frequency::Daily, interval), current).unwrap();
            prop_assert_eq!(next - current, chrono::Duration::days(i64::from(interval)));
        }

        #[test]
        fn weekly_delta_is_exactly_interval_weeks(
            current in arb_current(),
            interval in 1u32..=52,
        ) {
            let next = next_occurrence(&rule(Frequency::Weekly, interval), current).unwrap();
            prop_assert_eq!(next - current, chrono::Duration::weeks(i64::from(interval)));
        }

        #[test]
        fn monthly_day_is_target_or_month_end(
            current in arb_current(),
            interval in 1u32..=36,
            pin in proptest::option::of(1u8..=31),
        ) {
            let mut r = rule(Frequency::Monthly, interval);
            if let Some(day) = pin {
                r = r.with_day_of_month(day).unwrap();
            }

            let next = next_occurrence(&r, current).unwrap();
            let target = pin.map(u32::from).unwrap_or_else(|| current.day());
            prop_assert_eq!(
                next.day(),
                target.min(days_in_month(next.year(), next.month()))
            );
            prop_assert_eq!(next.time(), current.time());
        }

        #[test]
        fn next_is_always_strictly_later(
            current in arb_current(),
            interval in 1u32..=24,
            frequency in prop_oneof![
                Just(Frequency::Daily),
                Just(Frequency::Weekly),
                Just(Frequency::Monthly),
                Just(Frequency::Yearly),
            ],
        ) {
            let next = next_occurrence(&rule(frequency, interval), current).unwrap();
            prop_assert!(next > current);
        }

        #[test]
        fn result_never_exceeds_end_date(
            current in arb_current(),
            interval in 1u32..=24,
            end_offset_days in 0i64..800,
        ) {
            let end_date = (current + chrono::Duration::days(end_offset_days)).date_naive();
            let r = rule(Frequency::Monthly, interval).with_end_date(end_date);

            if let Some(next) = next_occurrence(&r, current) {
                prop_assert!(next.date_naive() <= end_date);
            }
        }
    }
}
