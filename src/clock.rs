//! Wall-clock times within a planning day.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PlannerError, Result};

/// Minutes after midnight. Serialized as `"HH:MM"`.
///
/// Values are not wrapped at 24h: a day that runs past midnight shows hours
/// of 24 and above rather than silently rolling into the next date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub const fn from_hm(hours: u32, minutes: u32) -> Self {
        Self(hours * 60 + minutes)
    }

    /// Parses `"HH:MM"` (seconds are accepted and ignored).
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map(|time| Self(time.hour() * 60 + time.minute()))
            .map_err(|_| PlannerError::InvalidClockTime(text.to_string()))
    }

    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Saturates instead of overflowing on absurd durations.
    pub const fn add_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    /// Minutes elapsed since `earlier`, zero if `earlier` is later.
    pub const fn since(self, earlier: ClockTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_extended(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid clock time {text:?}")))
    }
}

/// Accepts hours past 23 so serialized end times round-trip.
fn parse_extended(text: &str) -> Option<ClockTime> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.get(..2).unwrap_or(minutes).parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(ClockTime::from_hm(hours, minutes))
}
