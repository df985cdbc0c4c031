//! Board classification by code prefix.
//!
//! Board assignment rules drift over time, so the prefix partition is data:
//! a [`ClassifierTable`] can be loaded from configuration and corrected
//! without touching adapter code.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{StockId, ValidationError};

/// Market board an identifier is expected to trade on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketAffiliation {
    /// Main listed board (TWSE).
    Primary,
    /// Over-the-counter board (TPEx).
    Secondary,
    Unknown,
}

impl MarketAffiliation {
    pub const ALL: [Self; 3] = [Self::Primary, Self::Secondary, Self::Unknown];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for MarketAffiliation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prefix rule of the classifier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub affiliation: MarketAffiliation,
}

impl PrefixRule {
    pub fn new(
        prefix: impl Into<String>,
        affiliation: MarketAffiliation,
    ) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        check_prefix(&prefix)?;
        Ok(Self {
            prefix,
            affiliation,
        })
    }
}

/// Prefix table mapping identifiers to a [`MarketAffiliation`].
///
/// The longest matching prefix wins; identifiers matching no rule are
/// [`MarketAffiliation::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PrefixRule>", into = "Vec<PrefixRule>")]
pub struct ClassifierTable {
    rules: Vec<PrefixRule>,
}

impl Default for ClassifierTable {
    fn default() -> Self {
        use MarketAffiliation::{Primary, Secondary};

        let rules = [
            ("00", Primary),
            ("1", Primary),
            ("2", Primary),
            ("9", Primary),
            ("3", Secondary),
            ("4", Secondary),
            ("5", Secondary),
            ("6", Secondary),
            ("8", Secondary),
        ]
        .into_iter()
        .map(|(prefix, affiliation)| PrefixRule {
            prefix: prefix.to_owned(),
            affiliation,
        })
        .collect();

        Self { rules }
    }
}

impl ClassifierTable {
    pub fn new(rules: Vec<PrefixRule>) -> Result<Self, ValidationError> {
        for rule in &rules {
            check_prefix(&rule.prefix)?;
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    /// Classify an identifier. Total and deterministic.
    pub fn classify(&self, id: &StockId) -> MarketAffiliation {
        self.classify_str(id.as_str())
    }

    fn classify_str(&self, code: &str) -> MarketAffiliation {
        self.rules
            .iter()
            .filter(|rule| code.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.affiliation)
            .unwrap_or(MarketAffiliation::Unknown)
    }
}

impl TryFrom<Vec<PrefixRule>> for ClassifierTable {
    type Error = ValidationError;

    fn try_from(rules: Vec<PrefixRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<ClassifierTable> for Vec<PrefixRule> {
    fn from(table: ClassifierTable) -> Self {
        table.rules
    }
}

fn check_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::InvalidPrefix {
            value: prefix.to_owned(),
        });
    }
    Ok(())
}
