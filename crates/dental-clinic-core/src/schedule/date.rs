//! Canonical calendar dates.
//!
//! A canonical date is a `YYYY-MM-DD` string with no time of day and no
//! timezone. Structured dates are formatted from their calendar components;
//! strings have any time suffix cut off at `T` before validation. Neither
//! path goes through UTC, which is what used to shift days by one.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{ScheduleError, ScheduleResult};
use crate::models::Appointment;

/// Formats tried, in order, when a string is not already canonical.
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// A date as it arrives from a form.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// Value from a date picker, already in local calendar terms
    Picked(NaiveDate),
    /// Text field or stored value
    Raw(String),
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Picked(date)
    }
}

impl From<&str> for DateInput {
    fn from(raw: &str) -> Self {
        DateInput::Raw(raw.to_string())
    }
}

/// Normalize any accepted date input to a canonical string.
pub fn normalize_date(input: &DateInput) -> ScheduleResult<String> {
    match input {
        DateInput::Picked(date) => Ok(format_canonical(*date)),
        DateInput::Raw(raw) => normalize_date_str(raw),
    }
}

/// Normalize a date string. Canonical input is returned unchanged.
pub fn normalize_date_str(raw: &str) -> ScheduleResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::MissingField("date"));
    }

    // Keep the written calendar day of ISO date-times ("2024-03-05T23:30:00-05:00")
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);

    if has_canonical_shape(date_part) {
        return NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map(|_| date_part.to_string())
            .map_err(|_| ScheduleError::InvalidDate(raw.to_string()));
    }

    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Ok(format_canonical(date));
        }
    }
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(format_canonical(datetime.date()));
        }
    }

    Err(ScheduleError::InvalidDate(raw.to_string()))
}

/// Format a calendar date as `YYYY-MM-DD` from its components.
pub fn format_canonical(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Parse a canonical string back into a calendar date.
pub fn parse_canonical(date: &str) -> ScheduleResult<NaiveDate> {
    if !has_canonical_shape(date) {
        return Err(ScheduleError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(date.to_string()))
}

/// `^\d{4}-\d{2}-\d{2}$`
fn has_canonical_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Today in the local calendar.
pub fn today_canonical() -> String {
    local_day(Local::now())
}

/// Calendar day of a local date-time.
pub fn local_day(now: DateTime<Local>) -> String {
    format_canonical(now.date_naive())
}

/// Shift a canonical date by a number of days.
pub fn add_days(date: &str, days: i64) -> ScheduleResult<String> {
    let parsed = parse_canonical(date)?;
    parsed
        .checked_add_signed(Duration::days(days))
        .map(format_canonical)
        .ok_or_else(|| ScheduleError::InvalidDate(date.to_string()))
}

/// Which days an appointment list should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "date")]
pub enum DayFilter {
    Today,
    Tomorrow,
    /// Today and every later day
    Upcoming,
    On(String),
}

impl DayFilter {
    /// Resolve against `today` into an inclusive lower bound and optional exact day.
    fn bounds(&self, today: &str) -> ScheduleResult<(String, Option<String>)> {
        Ok(match self {
            DayFilter::Today => (today.to_string(), Some(today.to_string())),
            DayFilter::Tomorrow => {
                let tomorrow = add_days(today, 1)?;
                (tomorrow.clone(), Some(tomorrow))
            }
            DayFilter::Upcoming => (today.to_string(), None),
            DayFilter::On(date) => {
                let date = normalize_date_str(date)?;
                (date.clone(), Some(date))
            }
        })
    }

    /// Whether a canonical date passes the filter.
    pub fn matches(&self, date: &str, today: &str) -> ScheduleResult<bool> {
        let (from, exact) = self.bounds(today)?;
        Ok(match exact {
            Some(day) => date == day,
            None => date >= from.as_str(),
        })
    }
}

/// Appointments on the filtered days, ordered by date then start time.
pub fn filter_by_day<'a>(
    appointments: &'a [Appointment],
    filter: &DayFilter,
    today: &str,
) -> ScheduleResult<Vec<&'a Appointment>> {
    let (from, exact) = filter.bounds(today)?;
    let mut selected: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| match &exact {
            Some(day) => a.date == *day,
            None => a.date >= from,
        })
        .collect();
    selected.sort_by(|a, b| (&a.date, &a.start_time).cmp(&(&b.date, &b.start_time)));
    Ok(selected)
}
