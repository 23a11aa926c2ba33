//! Time range parameters for backend queries.
//!
//! The query API takes a `Duration` input of `{start, end, step}` where the
//! timestamp format depends on the step granularity.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of a query time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Minute,
    Hour,
    Day,
}

impl Step {
    /// The timestamp format the backend expects for this granularity.
    pub const fn timestamp_format(self) -> &'static str {
        match self {
            Self::Minute => "%Y-%m-%d %H%M",
            Self::Hour => "%Y-%m-%d %H",
            Self::Day => "%Y-%m-%d",
        }
    }
}

/// A query time range, forwarded verbatim as the `duration` variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub start: String,
    pub end: String,
    pub step: Step,
}

impl Duration {
    /// Build a duration from explicit bounds, formatted for the given step.
    #[must_use]
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>, step: Step) -> Self {
        let format = step.timestamp_format();
        Self {
            start: start.format(format).to_string(),
            end: end.format(format).to_string(),
            step,
        }
    }

    /// The trailing `minutes`-long window ending now, at minute granularity.
    #[must_use]
    pub fn last_minutes(minutes: i64) -> Self {
        let end = Utc::now();
        let start = end - TimeDelta::minutes(minutes);
        Self::range(start, end, Step::Minute)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::last_minutes(15)
    }
}
