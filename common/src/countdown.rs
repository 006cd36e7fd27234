use crate::calendar::{CurrentTime, TargetDate};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days left until the end of `target`, floored. Zero on the target
/// day itself, negative once it has passed.
pub fn days_remaining(target: TargetDate, now: &CurrentTime) -> i64 {
    (target.deadline_epoch_seconds() - now.epoch_seconds()).div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> CurrentTime {
        CurrentTime::from_fields(year, month, day, hour, minute, second).unwrap()
    }

    fn midnight(year: i32, month: u32, day: u32) -> CurrentTime {
        at(year, month, day, 0, 0, 0)
    }

    fn target(year: i64, month: i64, day: i64) -> TargetDate {
        TargetDate::from_ymd(year, month, day).unwrap()
    }

    #[test]
    fn counts_days_until_target() {
        assert_eq!(days_remaining(target(2025, 4, 30), &midnight(2025, 1, 1)), 119);
    }

    #[test]
    fn passed_target_goes_negative() {
        assert_eq!(days_remaining(target(2025, 4, 30), &midnight(2025, 5, 1)), -1);
        assert_eq!(days_remaining(target(2025, 4, 30), &midnight(2025, 5, 11)), -11);
    }

    #[test]
    fn target_day_is_zero_all_day() {
        let t = target(2025, 4, 30);
        assert_eq!(days_remaining(t, &at(2025, 4, 30, 0, 0, 0)), 0);
        assert_eq!(days_remaining(t, &at(2025, 4, 30, 12, 0, 0)), 0);
        assert_eq!(days_remaining(t, &at(2025, 4, 30, 23, 59, 59)), 0);
    }

    #[test]
    fn day_before_target_is_one() {
        let t = target(2025, 4, 30);
        assert_eq!(days_remaining(t, &at(2025, 4, 29, 0, 0, 1)), 1);
        assert_eq!(days_remaining(t, &at(2025, 4, 29, 23, 59, 59)), 1);
    }

    #[test]
    fn crosses_leap_days_and_years() {
        assert_eq!(days_remaining(target(2024, 3, 1), &midnight(2024, 2, 28)), 2);
        assert_eq!(days_remaining(target(2025, 3, 1), &midnight(2025, 2, 28)), 1);
        assert_eq!(days_remaining(target(2026, 1, 1), &midnight(2025, 12, 31)), 1);
        assert_eq!(days_remaining(target(2028, 1, 1), &midnight(2024, 1, 1)), 1461);
    }

    #[test]
    fn swapping_target_and_now_negates_at_midnight() {
        let dates = [(2025, 1, 1), (2025, 4, 30), (2024, 2, 29), (2019, 12, 31)];

        for &(ay, am, ad) in &dates {
            for &(by, bm, bd) in &dates {
                let forward = days_remaining(
                    target(ay as i64, am as i64, ad as i64),
                    &midnight(by, bm, bd),
                );
                let backward = days_remaining(
                    target(by as i64, bm as i64, bd as i64),
                    &midnight(ay, am, ad),
                );
                assert_eq!(forward, -backward, "{ay}-{am}-{ad} vs {by}-{bm}-{bd}");
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let t = target(2030, 6, 15);
        let now = at(2025, 8, 3, 17, 42, 5);
        let first = days_remaining(t, &now);
        assert_eq!(days_remaining(t, &now), first);
    }

    #[test]
    fn midnight_alarm_ticks_down_by_one() {
        let t = target(2025, 4, 30);
        let before = days_remaining(t, &at(2025, 4, 20, 0, 0, 1));
        let after = days_remaining(t, &at(2025, 4, 21, 0, 0, 1));
        assert_eq!(before - after, 1);
    }
}
