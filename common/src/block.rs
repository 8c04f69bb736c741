use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block header reduced to what the history engine needs.
///
/// Blocks are ordered: for `a.number < b.number`, `a.timestamp <= b.timestamp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    /// Seconds since the unix epoch, as reported in the block header.
    pub timestamp: u64,
}

impl Block {
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }

    pub fn timestamp_millis(&self) -> i128 {
        i128::from(self.timestamp) * 1000
    }

    /// Returns true if the block was produced at or before `instant`.
    pub fn is_at_or_before(&self, instant: &DateTime<Utc>) -> bool {
        self.timestamp_millis() <= i128::from(instant.timestamp_millis())
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.datetime() {
            Some(datetime) => write!(f, "#{} ({})", self.number, datetime.to_rfc3339()),
            None => write!(f, "#{} (timestamp {})", self.number, self.timestamp),
        }
    }
}
