use chrono::{Datelike, NaiveDate, Weekday};
use flow_estimate::{FlowError, WorkCalendar, WorkCalendarConfig};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn weekends_are_unavailable() {
    let cal = WorkCalendar::with_year_range(2025, 2025);
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    assert!(!cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(cal.is_available(d(2025, 1, 2)));
}

#[test]
fn standard_holidays_are_observed() {
    let cal = WorkCalendar::with_year_range(2025, 2025);
    for date in [
        d(2025, 1, 1),
        d(2025, 5, 26),
        d(2025, 7, 4),
        d(2025, 9, 1),
        d(2025, 11, 27),
        d(2025, 12, 25),
    ] {
        assert!(cal.is_holiday(date), "{date}");
        assert!(!cal.is_available(date), "{date}");
    }
    assert!(!cal.is_holiday(d(2025, 11, 20)));
}

#[test]
fn weekend_holidays_shift_to_nearest_weekday() {
    // July 4th 2026 is a Saturday, Christmas 2022 a Sunday.
    let cal = WorkCalendar::with_year_range(2022, 2026);
    assert!(cal.is_holiday(d(2026, 7, 3)));
    assert!(!cal.is_holiday(d(2026, 7, 4)));
    assert!(cal.is_holiday(d(2022, 12, 26)));
}

#[test]
fn reversed_year_range_is_accepted() {
    let cal = WorkCalendar::with_year_range(2026, 2025);
    assert!(cal.is_holiday(d(2025, 12, 25)));
    assert!(cal.is_holiday(d(2026, 12, 25)));
}

#[test]
fn find_next_available_counts_only_workdays() {
    let cal = WorkCalendar::with_year_range(2025, 2025);
    let mon = d(2025, 1, 6);
    let four_ahead = cal.find_next_available(mon, 4).unwrap();
    assert_eq!(four_ahead.weekday(), Weekday::Fri);
    assert_eq!(cal.find_next_available(d(2025, 1, 3), 1), Some(mon));
    // Memorial Day 2025-05-26 is skipped
    assert_eq!(cal.find_next_available(d(2025, 5, 23), 1), Some(d(2025, 5, 27)));
}

#[test]
fn find_next_available_stops_at_end_of_date_range() {
    let cal = WorkCalendar::with_year_range(2025, 2025);
    assert_eq!(cal.find_next_available(NaiveDate::MAX, 1), None);
}

#[test]
fn completion_date_rounds_workdays_up() {
    let cal = WorkCalendar::with_year_range(2025, 2025);
    assert_eq!(cal.completion_date(d(2025, 1, 6), 4.2), Some(d(2025, 1, 13)));
    assert_eq!(cal.completion_date(d(2025, 1, 6), 4.0), Some(d(2025, 1, 10)));
    assert_eq!(cal.completion_date(d(2025, 12, 24), 1.0), Some(d(2025, 12, 26)));
    assert_eq!(cal.completion_date(d(2025, 1, 6), -3.0), Some(d(2025, 1, 6)));
}

#[test]
fn oversized_durations_have_no_completion_date() {
    let cal = WorkCalendar::with_year_range(2025, 2025);
    let start = d(2025, 1, 6);
    assert_eq!(cal.completion_date(start, 7.0e7), None);
    assert_eq!(cal.completion_date(start, f64::INFINITY), None);
    assert_eq!(cal.completion_date(start, f64::NAN), None);
    assert!(cal.completion_date(start, WorkCalendar::MAX_WORKDAYS as f64).is_some());
}

#[test]
fn horizon_is_bounded_for_huge_durations() {
    let cal = WorkCalendar::for_horizon(d(2025, 1, 6), 1.0e300);
    assert!(cal.is_holiday(d(2025, 12, 25)));
    assert!(cal.is_holiday(d(2400, 12, 25)));
}

#[test]
fn horizon_covers_following_years() {
    let cal = WorkCalendar::for_horizon(d(2025, 11, 3), 300.0);
    assert!(cal.is_holiday(d(2026, 12, 25)));
    assert!(cal.is_holiday(d(2027, 1, 1)));
}

#[test]
fn set_working_days_includes_saturday() {
    let mut cal = WorkCalendar::with_year_range(2025, 2025);
    cal.set_working_days(&[
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ])
    .unwrap();
    assert!(cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
}

#[test]
fn empty_working_week_is_rejected() {
    let mut cal = WorkCalendar::with_year_range(2025, 2025);
    assert!(matches!(cal.set_working_days(&[]), Err(FlowError::Config(_))));

    let config = WorkCalendarConfig::new(Vec::new(), Vec::new());
    assert!(matches!(WorkCalendar::from_config(&config), Err(FlowError::Config(_))));
}

#[test]
fn custom_holidays_block_days() {
    let mut cal = WorkCalendar::with_year_range(2025, 2025);
    let custom = d(2025, 2, 4);
    cal.add_holiday(custom);
    assert!(!cal.is_available(custom));
}

#[test]
fn config_round_trips_through_json() {
    let mut cal = WorkCalendar::with_year_range(2025, 2025);
    cal.add_holiday(d(2025, 2, 4));
    cal.set_working_days(&[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu])
        .unwrap();

    let config = cal.to_config();
    assert_eq!(config.working_days(), &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu]);
    assert!(config.holidays().contains(&d(2025, 2, 4)));

    let json = serde_json::to_string(&config).unwrap();
    let decoded: WorkCalendarConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, config);
    assert_eq!(WorkCalendar::from_config(&decoded).unwrap(), cal);
}
