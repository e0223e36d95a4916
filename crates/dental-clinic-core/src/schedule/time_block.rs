//! Time-of-day values and appointment time blocks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ScheduleError, ScheduleResult};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Start hours of the catalog of common one-hour blocks (08:00-09:00 .. 18:00-19:00).
const COMMON_BLOCK_HOURS: std::ops::RangeInclusive<u8> = 8..=18;

/// A wall-clock time with minute precision, always rendered `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> ScheduleResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime(format!("{}:{}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    fn from_minutes(minutes: u16) -> Self {
        let minutes = minutes % MINUTES_PER_DAY;
        Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        }
    }

    /// Add minutes, wrapping past midnight.
    pub fn add_minutes(&self, minutes: u16) -> Self {
        Self::from_minutes(self.minutes_since_midnight() + minutes % MINUTES_PER_DAY)
    }

    /// 12-hour display label such as `9:00 AM` or `12:30 PM`.
    pub fn label_12h(&self) -> String {
        let (hour, suffix) = match self.hour {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute, suffix)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Accepts `HH:MM`, `H:MM` and `HH:MM:SS` (seconds must be zero).
impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_string());
        let mut parts = s.trim().split(':');

        let hour = parse_component(parts.next(), 1..=2).ok_or_else(invalid)?;
        let minute = parse_component(parts.next(), 2..=2).ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            if parse_component(Some(seconds), 2..=2) != Some(0) {
                return Err(invalid());
            }
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }
}

fn parse_component(part: Option<&str>, digits: std::ops::RangeInclusive<usize>) -> Option<u8> {
    let part = part?;
    if !digits.contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Normalize a time string to zero-padded `HH:MM`.
pub fn normalize_time(raw: &str) -> ScheduleResult<String> {
    if raw.trim().is_empty() {
        return Err(ScheduleError::MissingField("time"));
    }
    raw.parse::<TimeOfDay>().map(|t| t.to_string())
}

/// A (start, end) pair of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBlock {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeBlock {
    /// A storable block: start strictly before end.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> ScheduleResult<Self> {
        if start >= end {
            return Err(ScheduleError::InvalidTimeBlock {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse and validate a block from `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> ScheduleResult<Self> {
        Self::new(start.parse()?, end.parse()?)
    }

    /// Hour picker: `end = start + 1 hour`, wrapping at midnight (23:00 gives 00:00).
    pub fn one_hour_from(start: TimeOfDay) -> Self {
        Self {
            start,
            end: start.add_minutes(60),
        }
    }

    /// The catalog of common one-hour blocks offered in the appointment form.
    pub fn common_blocks() -> Vec<TimeBlock> {
        COMMON_BLOCK_HOURS
            .map(|hour| Self::one_hour_from(TimeOfDay { hour, minute: 0 }))
            .collect()
    }

    /// End is not after start, which only a midnight wrap produces.
    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> u16 {
        if self.wraps_midnight() {
            MINUTES_PER_DAY - self.start.minutes_since_midnight() + self.end.minutes_since_midnight()
        } else {
            self.end.minutes_since_midnight() - self.start.minutes_since_midnight()
        }
    }

    /// Half-open `[start, end)` overlap.
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `9:00 AM - 10:00 AM`; display only.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.start.label_12h(), self.end.label_12h())
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Slot start times every `step_minutes` from `open` up to, not including, `close`.
pub fn slots_between(open: TimeOfDay, close: TimeOfDay, step_minutes: u16) -> Vec<TimeOfDay> {
    if step_minutes == 0 {
        return Vec::new();
    }
    (open.minutes_since_midnight()..close.minutes_since_midnight())
        .step_by(step_minutes as usize)
        .map(TimeOfDay::from_minutes)
        .collect()
}

/// 30-minute slots across the business day, for the free-form time picker.
pub fn half_hour_slots(open: TimeOfDay, close: TimeOfDay) -> Vec<TimeOfDay> {
    slots_between(open, close, 30)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_format() {
        assert_eq!(t("09:00").to_string(), "09:00");
        assert_eq!(t("9:05").to_string(), "09:05");
        assert_eq!(t("14:30:00").to_string(), "14:30");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("12:5".parse::<TimeOfDay>().is_err());
        assert!("12:30:15".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_one_hour_derivation() {
        assert_eq!(TimeBlock::one_hour_from(t("09:00")).end.to_string(), "10:00");

        let late = TimeBlock::one_hour_from(t("23:00"));
        assert_eq!(late.end.to_string(), "00:00");
        assert!(late.wraps_midnight());
        assert_eq!(late.duration_minutes(), 60);
        // A wrapped block cannot be stored as start < end
        assert!(TimeBlock::new(late.start, late.end).is_err());
    }

    #[test]
    fn test_common_blocks_catalog() {
        let blocks = TimeBlock::common_blocks();
        assert_eq!(blocks.len(), 11);
        assert_eq!(blocks[0].to_string(), "08:00-09:00");
        assert_eq!(blocks[10].to_string(), "18:00-19:00");
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(TimeBlock::parse("09:00", "10:00").unwrap().display_label(), "9:00 AM - 10:00 AM");
        assert_eq!(TimeBlock::parse("11:30", "12:30").unwrap().display_label(), "11:30 AM - 12:30 PM");
        assert_eq!(TimeBlock::one_hour_from(t("23:00")).display_label(), "11:00 PM - 12:00 AM");
    }

    #[test]
    fn test_overlap_is_half_open() {
        let nine = TimeBlock::parse("09:00", "10:00").unwrap();
        let ten = TimeBlock::parse("10:00", "11:00").unwrap();
        let half = TimeBlock::parse("09:30", "10:30").unwrap();

        assert!(!nine.overlaps(&ten));
        assert!(nine.overlaps(&half));
        assert!(half.overlaps(&ten));
        assert!(nine.overlaps(&nine));
    }

    #[test]
    fn test_half_hour_slots() {
        let slots = half_hour_slots(t("08:00"), t("19:00"));
        assert_eq!(slots.len(), 22);
        assert_eq!(slots[0].to_string(), "08:00");
        assert_eq!(slots[1].to_string(), "08:30");
        assert_eq!(slots.last().unwrap().to_string(), "18:30");
    }

    #[test]
    fn test_slots_round_trip() {
        for slot in half_hour_slots(t("00:00"), t("23:59")) {
            let text = slot.to_string();
            assert_eq!(normalize_time(&text).unwrap(), text);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let block = TimeBlock::parse("08:00", "09:00").unwrap();
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"start":"08:00","end":"09:00"}"#);
        assert_eq!(serde_json::from_str::<TimeBlock>(&json).unwrap(), block);
    }
}
