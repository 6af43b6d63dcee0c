use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{FlowError, FlowResult};

/// Business calendar used to turn a workday count into a calendar date.
///
/// Built once by the caller and passed explicitly wherever completion dates
/// are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        let year = chrono::Local::now().year();
        Self::with_year_range(year, year + 1)
    }
}

impl WorkCalendar {
    /// Longest duration, in workdays, that still maps to a completion date.
    pub const MAX_WORKDAYS: i64 = 100_000;

    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Monday–Friday calendar observing the standard company holidays for
    /// every year in the range (inclusive).
    pub fn with_year_range(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut calendar = Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        };
        for year in start..=end {
            calendar.add_us_holidays(year);
        }
        calendar
    }

    /// Calendar covering every year a project starting on `start` could
    /// plausibly span for `workdays` business days.
    pub fn for_horizon(start: NaiveDate, workdays: f64) -> Self {
        let workdays = if workdays.is_nan() { 0.0 } else { workdays };
        let span_years = (workdays.clamp(0.0, Self::MAX_WORKDAYS as f64) / 200.0).ceil() as i32;
        Self::with_year_range(start.year(), start.year() + span_years + 1)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> FlowResult<Self> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(FlowError::Config(
                "work calendar requires at least one working day".to_string(),
            ));
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    /// New Year's Day, Memorial Day, Independence Day, Labor Day,
    /// Thanksgiving and Christmas. Fixed-date holidays falling on a weekend
    /// are observed on the closest weekday.
    fn add_us_holidays(&mut self, year: i32) {
        for (month, day) in [(1, 1), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(Self::observed(date));
            }
        }

        // Memorial Day (last Monday in May)
        if let Some(date) = Self::last_weekday(year, 5, Weekday::Mon) {
            self.holidays.insert(date);
        }
        // Labor Day (1st Monday in September)
        if let Some(date) = Self::nth_weekday(year, 9, Weekday::Mon, 1) {
            self.holidays.insert(date);
        }
        // Thanksgiving (4th Thursday in November)
        if let Some(date) = Self::nth_weekday(year, 11, Weekday::Thu, 4) {
            self.holidays.insert(date);
        }
    }

    fn observed(date: NaiveDate) -> NaiveDate {
        match date.weekday() {
            Weekday::Sat => date - Duration::days(1),
            Weekday::Sun => date + Duration::days(1),
            _ => date,
        }
    }

    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
        NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8)
    }

    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let mut date = first_of_next - Duration::days(1);
        while date.weekday() != weekday {
            date = date - Duration::days(1);
        }
        Some(date)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn set_working_days(&mut self, days: &[Weekday]) -> FlowResult<()> {
        if days.is_empty() {
            return Err(FlowError::Config(
                "work calendar requires at least one working day".to_string(),
            ));
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Check if a date is a working day
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// Find a date N available days ahead. `None` once the walk leaves
    /// chrono's date range.
    pub fn find_next_available(&self, from: NaiveDate, days_ahead: i64) -> Option<NaiveDate> {
        let mut current = from;
        let mut count = 0;

        while count < days_ahead {
            current = current.succ_opt()?;
            if self.is_available(current) {
                count += 1;
            }
        }
        Some(current)
    }

    /// Estimated completion date: `workdays` (rounded up) business days after
    /// `start`. Durations beyond [`Self::MAX_WORKDAYS`] have no date.
    pub fn completion_date(&self, start: NaiveDate, workdays: f64) -> Option<NaiveDate> {
        if workdays.is_nan() || workdays > Self::MAX_WORKDAYS as f64 {
            return None;
        }
        let days = workdays.max(0.0).ceil() as i64;
        self.find_next_available(start, days)
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day));
        WorkCalendarConfig::new(working, calendar.holidays.iter().copied())
    }
}
