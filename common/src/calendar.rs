use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The date being counted down to. The whole day counts as remaining, so the
/// deadline is its last second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetDate(NaiveDate);

const LAST_SECOND_OF_DAY: i64 = 86_399;

impl TargetDate {
    pub fn from_ymd(year: i64, month: i64, day: i64) -> Result<Self, ValidationError> {
        let invalid = ValidationError::InvalidDate { year, month, day };

        let (Ok(y), Ok(m), Ok(d)) = (
            i32::try_from(year),
            u32::try_from(month),
            u32::try_from(day),
        ) else {
            return Err(invalid);
        };

        NaiveDate::from_ymd_opt(y, m, d).map(Self).ok_or(invalid)
    }

    pub fn parse_iso(value: &str) -> Result<Self, ValidationError> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValidationError::MalformedIsoDate(value.to_string()))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// Timezone-naive epoch seconds of 23:59:59 on the target day.
    pub fn deadline_epoch_seconds(self) -> i64 {
        self.0.and_time(NaiveTime::default()).and_utc().timestamp() + LAST_SECOND_OF_DAY
    }
}

impl From<NaiveDate> for TargetDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for TargetDate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_iso(value)
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Wall-clock reading from the real-time clock. No timezone is attached; the
/// device treats all times as local.
///
/// Weekday and yearday are derived from the date rather than stored, so a
/// reading can never disagree with itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrentTime {
    datetime: NaiveDateTime,
    is_dst: Option<bool>,
}

impl CurrentTime {
    /// Sub-second precision is dropped; the clock counts whole seconds.
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self {
            datetime: datetime.with_nanosecond(0).unwrap_or(datetime),
            is_dst: None,
        }
    }

    pub fn from_fields(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)
            .map(Self::new)
    }

    pub fn with_dst(mut self, is_dst: Option<bool>) -> Self {
        self.is_dst = is_dst;
        self
    }

    pub fn year(&self) -> i32 {
        self.datetime.year()
    }

    pub fn month(&self) -> u32 {
        self.datetime.month()
    }

    pub fn day(&self) -> u32 {
        self.datetime.day()
    }

    pub fn hour(&self) -> u32 {
        self.datetime.hour()
    }

    pub fn minute(&self) -> u32 {
        self.datetime.minute()
    }

    pub fn second(&self) -> u32 {
        self.datetime.second()
    }

    /// Days since Monday (Monday = 0).
    pub fn weekday(&self) -> u32 {
        self.datetime.weekday().num_days_from_monday()
    }

    /// Day of the year, 1-based.
    pub fn yearday(&self) -> u32 {
        self.datetime.ordinal()
    }

    /// `None` when the time source did not say.
    pub fn is_dst(&self) -> Option<bool> {
        self.is_dst
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.datetime
    }

    /// Linear seconds using the same naive calendar as
    /// [`TargetDate::deadline_epoch_seconds`].
    pub fn epoch_seconds(&self) -> i64 {
        self.datetime.and_utc().timestamp()
    }
}

impl fmt::Display for CurrentTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {:02}:{:02}:{:02}",
            self.month(),
            self.day(),
            self.year(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_impossible_dates() {
        assert!(TargetDate::from_ymd(2025, 2, 29).is_err());
        assert!(TargetDate::from_ymd(2024, 2, 29).is_ok());
        assert!(TargetDate::from_ymd(2025, 13, 1).is_err());
        assert!(TargetDate::from_ymd(2025, -4, 30).is_err());
        assert!(TargetDate::from_ymd(i64::MAX, 1, 1).is_err());
    }

    #[test]
    fn parses_iso_dates_only() {
        let date = TargetDate::parse_iso(" 2025-04-30 ").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 4, 30));
        assert_eq!(date.to_string(), "2025-04-30");

        assert_eq!(
            TargetDate::parse_iso("30/04/2025"),
            Err(ValidationError::MalformedIsoDate("30/04/2025".to_string()))
        );
        assert!("2025-04-31".parse::<TargetDate>().is_err());
    }

    #[test]
    fn deadline_is_last_second_of_target_day() {
        let target = TargetDate::from_ymd(1970, 1, 2).unwrap();
        assert_eq!(target.deadline_epoch_seconds(), 86_400 + 86_399);
    }

    #[test]
    fn current_time_derives_weekday_and_yearday() {
        // 2025-04-30 was a Wednesday, day 120 of the year.
        let now = CurrentTime::from_fields(2025, 4, 30, 13, 5, 9).unwrap();
        assert_eq!(now.weekday(), 2);
        assert_eq!(now.yearday(), 120);
        assert_eq!(now.is_dst(), None);
        assert_eq!(now.to_string(), "4/30/2025 13:05:09");
    }
}
