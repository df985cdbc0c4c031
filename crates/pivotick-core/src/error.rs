use thiserror::Error;

/// Validation and contract errors exposed by `pivotick-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("stock id cannot be empty")]
    EmptyIdentifier,
    #[error("stock id length {len} exceeds max {max}")]
    IdentifierTooLong { len: usize, max: usize },
    #[error("stock id must contain digits only, found '{ch}' at index {index}")]
    InvalidIdentifier { ch: char, index: usize },

    #[error("'{value}' is not a decimal number")]
    NotNumeric { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be positive")]
    NonPositiveValue { field: &'static str },
    #[error("record high must be >= low")]
    InvalidRange,
    #[error("record close must be within the low/high range")]
    CloseOutOfRange,

    #[error("precision {digits} exceeds max {max} decimal digits")]
    PrecisionTooLarge { digits: u8, max: u8 },
    #[error("invalid pivot variant '{value}', expected one of classic, typical-full-range, typical-half-distance")]
    InvalidVariant { value: String },
    #[error("invalid freshness policy '{value}', expected latest-available or require-session-date")]
    InvalidFreshness { value: String },
    #[error("invalid source '{value}', expected one of twse, tpex, goodinfo, yahoo_tw")]
    InvalidSource { value: String },
    #[error("classifier prefix '{value}' must be non-empty ASCII digits")]
    InvalidPrefix { value: String },
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error("'{field}' must be greater than zero milliseconds")]
    ZeroTimeout { field: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
