//! Sample record returned by a [`crate::datasource::DataSource`] (§3).

use chrono::{DateTime, Utc};

/// The physical quantity a [`Sample`] carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Degrees in the source's native unit — conversion happens in `beer.rs`.
    Temperature(f64),
    /// Gravity in the source's native unit.
    Gravity(f64),
    /// pH, unitless.
    Ph(f64),
}

/// An immutable, timestamped reading (§3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: Value,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: Value) -> Self {
        Self { timestamp, value }
    }

    /// Age of this sample relative to `now`, floored at zero (a sample
    /// timestamped in the future is treated as brand new rather than
    /// producing a negative age).
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.timestamp).max(chrono::Duration::zero())
    }
}

/// Freshness classification for a queried sample (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}
