//! CDP pivot-band formulas.
//!
//! Several bots labelled different formulas "CDP". Each one is a distinct
//! [`PivotVariant`] and the caller always picks one explicitly.
//!
//! | Variant | Pivot | Bands |
//! |---------|-------|-------|
//! | `Classic` | `(H + L + 2C) / 4` | `AH = cdp + R`, `NH = 2cdp - L`, `NL = 2cdp - H`, `AL = cdp - R` |
//! | `TypicalFullRange` | `(H + L + C) / 3` | same band equations as `Classic` |
//! | `TypicalHalfDistance` | `(H + L + C) / 3` | `NH = cdp + (H - cdp)/2`, `NL = cdp - (cdp - L)/2`, `AH/AL = cdp ± R/2` |
//!
//! `R` is the daily range `H - L`. Rounding happens once, on the final
//! values.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::check_prices;
use crate::{ValidatedRecord, ValidationError};

const MAX_PRECISION: u8 = 4;

/// Pivot formula family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PivotVariant {
    #[default]
    Classic,
    TypicalFullRange,
    TypicalHalfDistance,
}

impl PivotVariant {
    pub const ALL: [Self; 3] = [
        Self::Classic,
        Self::TypicalFullRange,
        Self::TypicalHalfDistance,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::TypicalFullRange => "typical-full-range",
            Self::TypicalHalfDistance => "typical-half-distance",
        }
    }
}

impl Display for PivotVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PivotVariant {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "classic" | "cdp" => Ok(Self::Classic),
            "typical-full-range" => Ok(Self::TypicalFullRange),
            "typical-half-distance" => Ok(Self::TypicalHalfDistance),
            other => Err(ValidationError::InvalidVariant {
                value: other.to_owned(),
            }),
        }
    }
}

/// Number of decimal digits kept in the published bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Precision(u8);

impl Default for Precision {
    fn default() -> Self {
        Self(1)
    }
}

impl Precision {
    pub fn new(digits: u8) -> Result<Self, ValidationError> {
        if digits > MAX_PRECISION {
            return Err(ValidationError::PrecisionTooLarge {
                digits,
                max: MAX_PRECISION,
            });
        }
        Ok(Self(digits))
    }

    pub const fn digits(self) -> u8 {
        self.0
    }

    /// Round half away from zero to this precision.
    pub fn round(self, value: f64) -> f64 {
        let scale = 10_f64.powi(i32::from(self.0));
        (value * scale).round() / scale
    }
}

impl TryFrom<u8> for Precision {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Precision> for u8 {
    fn from(value: Precision) -> Self {
        value.0
    }
}

/// Next-session support/resistance bands.
///
/// `ah`/`nh`/`nl`/`al` are strong resistance, weak resistance, weak support
/// and strong support.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotBands {
    pub variant: PivotVariant,
    pub cdp: f64,
    pub ah: f64,
    pub nh: f64,
    pub nl: f64,
    pub al: f64,
}

impl PivotBands {
    fn rounded(self, precision: Precision) -> Self {
        Self {
            variant: self.variant,
            cdp: precision.round(self.cdp),
            ah: precision.round(self.ah),
            nh: precision.round(self.nh),
            nl: precision.round(self.nl),
            al: precision.round(self.al),
        }
    }
}

/// Evaluate a pivot variant on a validated record, rounded for display.
pub fn compute_pivots(
    record: &ValidatedRecord,
    variant: PivotVariant,
    precision: Precision,
) -> PivotBands {
    evaluate(variant, record.high(), record.low(), record.close()).rounded(precision)
}

/// Evaluate a pivot variant on explicit prices, checked like a record.
pub fn compute_pivots_from_prices(
    high: f64,
    low: f64,
    close: f64,
    variant: PivotVariant,
    precision: Precision,
) -> Result<PivotBands, ValidationError> {
    check_prices(high, low, close)?;
    Ok(evaluate(variant, high, low, close).rounded(precision))
}

fn evaluate(variant: PivotVariant, high: f64, low: f64, close: f64) -> PivotBands {
    let range = high - low;
    match variant {
        PivotVariant::Classic => {
            let cdp = (high + low + 2.0 * close) / 4.0;
            full_range_bands(variant, cdp, high, low, range)
        }
        PivotVariant::TypicalFullRange => {
            let cdp = (high + low + close) / 3.0;
            full_range_bands(variant, cdp, high, low, range)
        }
        PivotVariant::TypicalHalfDistance => {
            let cdp = (high + low + close) / 3.0;
            PivotBands {
                variant,
                cdp,
                ah: cdp + range / 2.0,
                nh: cdp + (high - cdp) / 2.0,
                nl: cdp - (cdp - low) / 2.0,
                al: cdp - range / 2.0,
            }
        }
    }
}

fn full_range_bands(variant: PivotVariant, cdp: f64, high: f64, low: f64, range: f64) -> PivotBands {
    PivotBands {
        variant,
        cdp,
        ah: cdp + range,
        nh: 2.0 * cdp - low,
        nl: 2.0 * cdp - high,
        al: cdp - range,
    }
}
