use serde::{Deserialize, Serialize};
use time::Date;

use crate::SourceId;

/// Daily high/low/close as extracted by one adapter, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub source: SourceId,
    pub as_of: Option<Date>,
}

impl RawRecord {
    pub fn new(high: f64, low: f64, close: f64, source: SourceId) -> Self {
        Self {
            high,
            low,
            close,
            source,
            as_of: None,
        }
    }

    pub fn with_as_of(mut self, as_of: Date) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

/// A record whose values passed the OHLC invariant checks.
///
/// Only [`crate::validation::validate`] constructs this type, so holding one
/// guarantees `low <= close <= high` with all values finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    high: f64,
    low: f64,
    close: f64,
    source: SourceId,
    as_of: Option<Date>,
}

impl ValidatedRecord {
    pub(crate) fn from_checked(raw: RawRecord) -> Self {
        Self {
            high: raw.high,
            low: raw.low,
            close: raw.close,
            source: raw.source,
            as_of: raw.as_of,
        }
    }

    pub const fn high(&self) -> f64 {
        self.high
    }

    pub const fn low(&self) -> f64 {
        self.low
    }

    pub const fn close(&self) -> f64 {
        self.close
    }

    pub const fn source(&self) -> SourceId {
        self.source
    }

    pub const fn as_of(&self) -> Option<Date> {
        self.as_of
    }

    /// Daily range `high - low`; zero when the stock did not move.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
