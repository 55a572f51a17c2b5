//! Property-based tests for the planner and persisted record types.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tempo_scheduler::{FileChange, RetryItem, SchedulerConfig, Statistics, WorkUnit, generate_plan};

// Strategy for a valid active-hour window (start < end).
fn hour_window() -> impl Strategy<Value = (u32, u32)> {
    (0u32..23).prop_flat_map(|start| ((start + 1)..=23).prop_map(move |end| (start, end)))
}

// Strategy for a valid quota range (min <= max).
fn quota_range() -> impl Strategy<Value = (u32, u32)> {
    (0u32..6).prop_flat_map(|min| (min..=8).prop_map(move |max| (min, max)))
}

// Strategy for weekday dates in 2025 (planner treats weekends specially).
fn weekday_2025() -> impl Strategy<Value = NaiveDate> {
    (1u32..=28, 1u32..=12).prop_filter_map("weekday", |(day, month)| {
        let date = NaiveDate::from_ymd_opt(2025, month, day)?;
        use chrono::Datelike;
        match date.weekday() {
            chrono::Weekday::Sat | chrono::Weekday::Sun => None,
            _ => Some(date),
        }
    })
}

proptest! {
    // Plan length always lands inside the quota range, and every timestamp
    // stays inside the active window, sorted ascending.
    #[test]
    fn plan_respects_quota_and_window(
        (min, max) in quota_range(),
        (start, end) in hour_window(),
        jitter in 0i64..90,
        seed in 0u64..1000,
        date in weekday_2025(),
    ) {
        let config = SchedulerConfig {
            min_commits_per_day: min,
            max_commits_per_day: max,
            active_start_hour: start,
            active_end_hour: end,
            jitter_minutes: jitter,
            weekends_allowed: false,
            ..Default::default()
        };

        // Plan from well before the window so no compression applies.
        let now = date.pred_opt().unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let plan = generate_plan(date, now, &config, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert!(plan.len() as u32 >= min && plan.len() as u32 <= max);

        let window_start = date.and_hms_opt(start, 0, 0).unwrap().and_utc();
        let window_end = date.and_hms_opt(end, 0, 0).unwrap().and_utc();
        for at in &plan.times {
            prop_assert!(*at >= window_start && *at <= window_end);
        }
        for pair in plan.times.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
    }

    // The same seed always produces the same plan.
    #[test]
    fn plan_is_deterministic_for_a_seed(seed in 0u64..1000, date in weekday_2025()) {
        let config = SchedulerConfig {
            min_commits_per_day: 1,
            max_commits_per_day: 6,
            jitter_minutes: 20,
            weekends_allowed: false,
            ..Default::default()
        };
        let now = date.pred_opt().unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();

        let a = generate_plan(date, now, &config, &mut StdRng::seed_from_u64(seed)).unwrap();
        let b = generate_plan(date, now, &config, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a, b);
    }

    // Mid-day planning never changes the quota, only compresses the window.
    #[test]
    fn midday_compression_preserves_quota(
        seed in 0u64..500,
        start_minute in 0i64..600,
        date in weekday_2025(),
    ) {
        let config = SchedulerConfig {
            min_commits_per_day: 4,
            max_commits_per_day: 4,
            active_start_hour: 8,
            active_end_hour: 20,
            jitter_minutes: 10,
            weekends_allowed: false,
            ..Default::default()
        };

        // `now` somewhere inside the first ten hours of the window, leaving
        // at least the five-minute margin before it closes.
        let now = date.and_hms_opt(8, 0, 0).unwrap().and_utc()
            + chrono::Duration::minutes(start_minute);
        let plan = generate_plan(date, now, &config, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert_eq!(plan.len(), 4);
        for at in &plan.times {
            prop_assert!(*at >= now);
        }
    }

    // Persisted retry items survive a serde roundtrip unchanged.
    #[test]
    fn retry_item_roundtrip(
        attempt in 0u32..10,
        max in 1u32..10,
        message in ".{1,80}",
        error in ".{1,80}",
    ) {
        let item = RetryItem {
            id: "0198a6e2".to_string(),
            payload: WorkUnit {
                message: message.clone(),
                changes: vec![FileChange {
                    path: "docs/overview.md".to_string(),
                    content: "text\n".to_string(),
                    append: false,
                }],
            },
            created_at: Utc::now(),
            attempt_count: attempt,
            max_attempts: max,
            next_retry_at: Utc::now(),
            last_error: error.clone(),
        };

        let json = serde_json::to_string(&item).unwrap();
        let decoded: RetryItem = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(decoded.attempt_count, attempt);
        prop_assert_eq!(decoded.payload.message, message);
        prop_assert_eq!(decoded.last_error, error);
    }

    // Statistics roundtrip preserves the ledger invariant fields.
    #[test]
    fn statistics_roundtrip(success in 0u64..1000, failed in 0u64..1000, pending in 0u64..50) {
        let mut stats = Statistics::new(Utc::now());
        stats.total_commits = success + failed;
        stats.successful_commits = success;
        stats.failed_commits = failed;
        stats.pending_commits = pending;

        let json = serde_json::to_string(&stats).unwrap();
        let decoded: Statistics = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(
            decoded.total_commits,
            decoded.successful_commits + decoded.failed_commits
        );
        prop_assert_eq!(decoded.pending_commits, pending);
    }
}
