use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::numeric::fold_full_width;
use crate::ValidationError;

const MAX_STOCK_ID_LEN: usize = 6;

/// Validated Taiwan stock code (digits only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockId(String);

impl StockId {
    /// Parse a user token into a stock id.
    ///
    /// Full-width digits are folded to ASCII so that input typed with an
    /// East Asian IME is accepted.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized: String = input.trim().chars().map(fold_full_width).collect();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyIdentifier);
        }

        let len = normalized.chars().count();
        if len > MAX_STOCK_ID_LEN {
            return Err(ValidationError::IdentifierTooLong {
                len,
                max: MAX_STOCK_ID_LEN,
            });
        }

        if let Some((index, ch)) = normalized
            .chars()
            .enumerate()
            .find(|(_, ch)| !ch.is_ascii_digit())
        {
            return Err(ValidationError::InvalidIdentifier { ch, index });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StockId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for StockId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StockId> for String {
    fn from(value: StockId) -> Self {
        value.0
    }
}
