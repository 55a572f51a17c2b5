//! Daily plan generation.
//!
//! Turns a quota range and an active-hour window into a concrete, jittered
//! timetable for one calendar date. Pure with respect to its inputs: callers
//! supply `now` and the random source, so plans are reproducible under test.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::Rng;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::types::DailyPlan;

/// Margin applied when planning starts mid-day: the first slot is never
/// scheduled sooner than this far into the future.
const MIDDAY_START_MARGIN_MINUTES: i64 = 5;

/// Generate the execution timetable for `date`.
///
/// Draws the day's quota uniformly from the configured range, spaces the
/// timestamps evenly across the active window, perturbs each by an
/// independent jitter, and clamps the results back into the window.
///
/// Returns an empty plan (not an error) on disallowed weekends, a zero draw,
/// or when the remaining window has already passed.
pub fn generate_plan(
    date: NaiveDate,
    now: DateTime<Utc>,
    config: &SchedulerConfig,
    rng: &mut impl Rng,
) -> Result<DailyPlan, SchedulerError> {
    if config.min_commits_per_day > config.max_commits_per_day {
        return Err(SchedulerError::InvalidConfig(
            "min_commits_per_day cannot be greater than max_commits_per_day".to_string(),
        ));
    }
    if config.active_start_hour > 23 || config.active_end_hour > 23 {
        return Err(SchedulerError::InvalidConfig(
            "active hours must be between 0 and 23".to_string(),
        ));
    }
    if config.active_start_hour >= config.active_end_hour {
        return Err(SchedulerError::InvalidConfig(
            "active_start_hour must be less than active_end_hour".to_string(),
        ));
    }

    let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
    if weekend && !config.weekends_allowed {
        return Ok(DailyPlan::empty(date));
    }

    let quota = rng.random_range(config.min_commits_per_day..=config.max_commits_per_day);
    if quota == 0 {
        return Ok(DailyPlan::empty(date));
    }

    let window_start = hour_of(date, config.active_start_hour)?;
    let window_end = hour_of(date, config.active_end_hour)?;

    // Planning mid-day compresses the window instead of shrinking the quota.
    let mut effective_start = window_start;
    if effective_start < now {
        effective_start = now + Duration::minutes(MIDDAY_START_MARGIN_MINUTES);
    }
    if effective_start > window_end {
        return Ok(DailyPlan::empty(date));
    }

    if quota == 1 {
        let midpoint = effective_start + (window_end - effective_start) / 2;
        return Ok(DailyPlan {
            date,
            times: vec![midpoint],
        });
    }

    let window_minutes = (window_end - effective_start).num_minutes();
    let spacing = window_minutes as f64 / (quota - 1) as f64;

    let mut times = Vec::with_capacity(quota as usize);
    for i in 0..quota {
        let offset = (spacing * f64::from(i)).round() as i64;
        let mut at = effective_start + Duration::minutes(offset);

        if config.jitter_minutes > 0 {
            let jitter = rng.random_range(-config.jitter_minutes..=config.jitter_minutes);
            at += Duration::minutes(jitter);
        }

        times.push(at.clamp(effective_start, window_end));
    }

    // Duplicates are allowed; downstream execution serializes them in order.
    times.sort_unstable();

    Ok(DailyPlan { date, times })
}

/// UTC instant at `hour:00:00` of `date`.
fn hour_of(date: NaiveDate, hour: u32) -> Result<DateTime<Utc>, SchedulerError> {
    date.and_hms_opt(hour, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| SchedulerError::InvalidConfig(format!("invalid hour of day: {hour}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use test_case::test_case;

    fn config(min: u32, max: u32, start: u32, end: u32, jitter: i64) -> SchedulerConfig {
        SchedulerConfig {
            min_commits_per_day: min,
            max_commits_per_day: max,
            active_start_hour: start,
            active_end_hour: end,
            jitter_minutes: jitter,
            weekends_allowed: false,
            ..Default::default()
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// A `now` well before the window opens, so no compression applies.
    fn day_before(date: NaiveDate) -> DateTime<Utc> {
        date.pred_opt().unwrap().and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    // 2025-06-03 is a Tuesday.
    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    // 2025-06-07 is a Saturday.
    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()
    }

    #[test]
    fn test_single_commit_lands_at_window_midpoint() {
        let date = tuesday();
        let plan = generate_plan(date, day_before(date), &config(1, 1, 9, 21, 0), &mut rng())
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan.times[0],
            date.and_hms_opt(15, 0, 0).unwrap().and_utc()
        );
    }

    #[test]
    fn test_three_commits_evenly_spaced_over_full_day() {
        let date = tuesday();
        let plan = generate_plan(date, day_before(date), &config(3, 3, 0, 23, 0), &mut rng())
            .unwrap();

        let expected: Vec<_> = [(0, 0), (11, 30), (23, 0)]
            .iter()
            .map(|&(h, m)| date.and_hms_opt(h, m, 0).unwrap().and_utc())
            .collect();
        assert_eq!(plan.times, expected);
    }

    #[test]
    fn test_weekend_disallowed_yields_empty_plan() {
        let date = saturday();
        let plan = generate_plan(date, day_before(date), &config(3, 5, 9, 21, 0), &mut rng())
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_weekend_allowed_schedules_normally() {
        let date = saturday();
        let mut cfg = config(2, 2, 9, 21, 0);
        cfg.weekends_allowed = true;

        let plan = generate_plan(date, day_before(date), &cfg, &mut rng()).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_quota_drawn_within_range() {
        let date = tuesday();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan =
                generate_plan(date, day_before(date), &config(2, 6, 9, 21, 15), &mut rng)
                    .unwrap();
            assert!((2..=6).contains(&plan.len()));
        }
    }

    #[test]
    fn test_timestamps_stay_inside_window_and_sorted() {
        let date = tuesday();
        let start = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
        let end = date.and_hms_opt(21, 0, 0).unwrap().and_utc();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan =
                generate_plan(date, day_before(date), &config(4, 4, 9, 21, 45), &mut rng)
                    .unwrap();

            for window in plan.times.windows(2) {
                assert!(window[0] <= window[1]);
            }
            for at in &plan.times {
                assert!(*at >= start && *at <= end);
            }
        }
    }

    #[test]
    fn test_midday_start_compresses_window_without_changing_quota() {
        let date = tuesday();
        let now = date.and_hms_opt(20, 30, 0).unwrap().and_utc();

        let plan = generate_plan(date, now, &config(5, 5, 9, 21, 0), &mut rng()).unwrap();

        assert_eq!(plan.len(), 5);
        let compressed_start = now + Duration::minutes(5);
        let end = date.and_hms_opt(21, 0, 0).unwrap().and_utc();
        for at in &plan.times {
            assert!(*at >= compressed_start && *at <= end);
        }
    }

    #[test]
    fn test_window_fully_elapsed_yields_empty_plan() {
        let date = tuesday();
        let now = date.and_hms_opt(21, 30, 0).unwrap().and_utc();

        let plan = generate_plan(date, now, &config(3, 3, 9, 21, 0), &mut rng()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_zero_quota_yields_empty_plan() {
        let date = tuesday();
        let plan = generate_plan(date, day_before(date), &config(0, 0, 9, 21, 0), &mut rng())
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test_case(5, 2, 9, 21 ; "inverted quota")]
    #[test_case(1, 3, 21, 9 ; "inverted hours")]
    #[test_case(1, 3, 9, 24 ; "hour out of range")]
    fn test_invalid_inputs_rejected(min: u32, max: u32, start: u32, end: u32) {
        let date = tuesday();
        let result = generate_plan(
            date,
            day_before(date),
            &config(min, max, start, end, 0),
            &mut rng(),
        );
        assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
    }
}
