//! Scheduling state model.
//!
//! Everything temporal about an appointment goes through this module:
//!
//! - [`date`]: canonical `YYYY-MM-DD` normalization and day filters
//! - [`time_block`]: `HH:MM` parsing, one-hour blocks, half-hour slots
//! - [`status`]: the flat status state machine
//! - [`conflict`]: doctor double-booking detection
//! - [`validate`]: form validation before anything reaches the database
//!
//! Calendar dates are compared as canonical strings, never as date-time
//! values, so no timezone offset can move an appointment to another day.

pub mod conflict;
pub mod date;
pub mod status;
pub mod time_block;
pub mod validate;

pub use conflict::*;
pub use date::*;
pub use status::*;
pub use time_block::*;
pub use validate::*;

use thiserror::Error;

/// Scheduling errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid time block: {start} must be before {end}")]
    InvalidTimeBlock { start: String, end: String },

    #[error("Date {date} is in the past (today is {today})")]
    PastDate { date: String, today: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Doctor already has {} overlapping appointment(s): {}", .0.len(), .0.join(", "))]
    Conflict(Vec<String>),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
