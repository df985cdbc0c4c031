//! OHLC record validation.
//!
//! Checks run in a fixed order so the first reported problem is stable:
//! 1. high, low and close are finite and positive
//! 2. `high >= low`
//! 3. `low <= close <= high`

use crate::{RawRecord, ValidatedRecord, ValidationError};

/// Accept or reject a raw adapter record.
pub fn validate(raw: RawRecord) -> Result<ValidatedRecord, ValidationError> {
    check_prices(raw.high, raw.low, raw.close)?;
    Ok(ValidatedRecord::from_checked(raw))
}

/// Run the record checks on bare prices.
pub fn check_prices(high: f64, low: f64, close: f64) -> Result<(), ValidationError> {
    for (field, value) in [("high", high), ("low", low), ("close", close)] {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositiveValue { field });
        }
    }

    if high < low {
        return Err(ValidationError::InvalidRange);
    }

    if close < low || close > high {
        return Err(ValidationError::CloseOutOfRange);
    }

    Ok(())
}

impl TryFrom<RawRecord> for ValidatedRecord {
    type Error = ValidationError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        validate(raw)
    }
}
