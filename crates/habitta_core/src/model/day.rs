//! Calendar-day primitive.
//!
//! # Responsibility
//! - Normalize instants to calendar days under an explicit day boundary.
//! - Provide whole-day arithmetic for streak and expiry rules.
//!
//! # Invariants
//! - `CalendarDay` carries no time-of-day component.
//! - Weekday numbering is `0 = Sunday .. 6 = Saturday`.
//! - Wire and storage form is ISO `YYYY-MM-DD`.

use chrono::{DateTime, Datelike, Days, FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted UTC offset for a fixed day boundary, in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// A date with no time-of-day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Builds a day from year/month/day parts, `None` when out of range.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Truncates an instant to the day it falls on under `boundary`.
    pub fn from_instant(instant: DateTime<Utc>, boundary: DayBoundary) -> Self {
        boundary.day_of(instant)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Weekday number, `0 = Sunday`.
    pub fn weekday(self) -> u8 {
        // num_days_from_sunday is always within 0..=6.
        self.0.weekday().num_days_from_sunday() as u8
    }

    /// Following day. Saturates at the calendar maximum.
    pub fn succ(self) -> Self {
        self.0.succ_opt().map_or(self, Self)
    }

    /// Preceding day. Saturates at the calendar minimum.
    pub fn pred(self) -> Self {
        self.0.pred_opt().map_or(self, Self)
    }

    pub fn add_days(self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(Self)
    }

    pub fn sub_days(self, days: u64) -> Option<Self> {
        self.0.checked_sub_days(Days::new(days)).map(Self)
    }
}

/// Whole days from `b` to `a`; positive when `a` is later.
pub fn day_diff(a: CalendarDay, b: CalendarDay) -> i64 {
    a.0.signed_duration_since(b.0).num_days()
}

impl Display for CalendarDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for CalendarDay {
    type Err = chrono::ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(value.trim(), DAY_FORMAT).map(Self)
    }
}

/// Policy deciding where one calendar day ends and the next begins.
///
/// `Local` reproduces server-local midnight truncation. `FixedOffset` pins
/// the boundary to an explicit UTC offset so results do not depend on the
/// host timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DayBoundary {
    #[default]
    Local,
    FixedOffset {
        /// Offset east of UTC, in minutes.
        minutes: i32,
    },
}

impl DayBoundary {
    /// Returns whether the offset is representable.
    pub fn is_valid(self) -> bool {
        match self {
            Self::Local => true,
            Self::FixedOffset { minutes } => minutes.abs() <= MAX_OFFSET_MINUTES,
        }
    }

    /// Calendar day that `instant` falls on.
    ///
    /// An unrepresentable fixed offset falls back to UTC.
    pub fn day_of(self, instant: DateTime<Utc>) -> CalendarDay {
        match self {
            Self::Local => CalendarDay(instant.with_timezone(&Local).date_naive()),
            Self::FixedOffset { minutes } => match FixedOffset::east_opt(minutes * 60) {
                Some(offset) => CalendarDay(instant.with_timezone(&offset).date_naive()),
                None => CalendarDay(instant.date_naive()),
            },
        }
    }

    /// Current calendar day from the wall clock.
    pub fn today(self) -> CalendarDay {
        self.day_of(Utc::now())
    }
}
