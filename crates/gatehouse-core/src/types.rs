//! Common type definitions used throughout Gatehouse.

use crate::errors::GatehouseError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A biometric template: the fixed-length vector produced by the upstream
/// face-extraction step.
pub type Encoding = Vec<f64>;

/// Format of the `allowed_start` / `allowed_end` strings.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Globally unique identifier of an enrolled person (an employee number in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Creates a new IdentityId from a string-like type.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The daily `[start, end]` interval during which an identity may pass.
///
/// Only same-day windows exist: construction rejects `start > end`, so a
/// window such as `22:00`-`06:00` can never be enrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow", into = "RawTimeWindow")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Builds a window from already-parsed times.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, GatehouseError> {
        if start > end {
            return Err(GatehouseError::invalid_window(
                format!(
                    "{}-{}",
                    start.format(TIME_OF_DAY_FORMAT),
                    end.format(TIME_OF_DAY_FORMAT)
                ),
                "windows crossing midnight are not supported; allowed_start must not be after allowed_end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Parses a window from two `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, GatehouseError> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    /// First authorized instant of the day.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Last authorized instant of the day.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Inclusive same-day containment check.
    pub fn contains(&self, time_of_day: NaiveTime) -> bool {
        self.start <= time_of_day && time_of_day <= self.end
    }

    /// `allowed_start` rendered as `HH:MM`.
    pub fn start_str(&self) -> String {
        self.start.format(TIME_OF_DAY_FORMAT).to_string()
    }

    /// `allowed_end` rendered as `HH:MM`.
    pub fn end_str(&self) -> String {
        self.end.format(TIME_OF_DAY_FORMAT).to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.start_str(), self.end_str())
    }
}

/// Parses a single `HH:MM` time of day.
///
/// Only the canonical zero-padded form is accepted, so the stored string
/// always equals what the caller sent.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, GatehouseError> {
    let parsed = NaiveTime::parse_from_str(value, TIME_OF_DAY_FORMAT)
        .map_err(|e| GatehouseError::invalid_window(value, format!("expected HH:MM: {}", e)))?;
    if value.len() != 5 || parsed.format(TIME_OF_DAY_FORMAT).to_string() != value {
        return Err(GatehouseError::invalid_window(
            value,
            "expected zero-padded HH:MM",
        ));
    }
    Ok(parsed)
}

/// Wire shape of a [`TimeWindow`].
#[derive(Serialize, Deserialize)]
struct RawTimeWindow {
    allowed_start: String,
    allowed_end: String,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = GatehouseError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::parse(&raw.allowed_start, &raw.allowed_end)
    }
}

impl From<TimeWindow> for RawTimeWindow {
    fn from(window: TimeWindow) -> Self {
        RawTimeWindow {
            allowed_start: window.start_str(),
            allowed_end: window.end_str(),
        }
    }
}
