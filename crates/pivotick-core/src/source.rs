use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical adapter identifiers used in priority tables and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Twse,
    Tpex,
    Goodinfo,
    YahooTw,
}

impl SourceId {
    pub const ALL: [Self; 4] = [Self::Twse, Self::Tpex, Self::Goodinfo, Self::YahooTw];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twse => "twse",
            Self::Tpex => "tpex",
            Self::Goodinfo => "goodinfo",
            Self::YahooTw => "yahoo_tw",
        }
    }

    /// Upstream service the adapter talks to.
    pub const fn upstream(self) -> Upstream {
        match self {
            Self::Twse => Upstream::Twse,
            Self::Tpex => Upstream::Tpex,
            Self::Goodinfo => Upstream::Goodinfo,
            Self::YahooTw => Upstream::Yahoo,
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "twse" => Ok(Self::Twse),
            "tpex" => Ok(Self::Tpex),
            "goodinfo" => Ok(Self::Goodinfo),
            "yahoo_tw" | "yahoo-tw" | "yahoo" => Ok(Self::YahooTw),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// Upstream scope shared by adapters hitting the same service.
///
/// A definitive "no such identifier" from one adapter exhausts its scope for
/// the rest of the resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    Twse,
    Tpex,
    Goodinfo,
    Yahoo,
}
