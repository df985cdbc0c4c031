//! Resolver configuration.
//!
//! Values come from a JSON file and are then overridden by environment
//! variables. Every field has a default, so an empty file (or no file) is a
//! valid configuration.
//!
//! # Environment Variables
//!
//! | Variable | Overrides | Example |
//! |----------|-----------|---------|
//! | `PIVOTICK_CONFIG` | path of the JSON file | `/etc/pivotick.json` |
//! | `PIVOTICK_TIMEOUT_MS` | `adapter_timeout_ms` | `8000` |
//! | `PIVOTICK_VARIANT` | `variant` | `typical-half-distance` |
//! | `PIVOTICK_PRECISION` | `precision` | `2` |
//! | `PIVOTICK_FRESHNESS` | `freshness` | `require-session-date` |

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::adapters::DEFAULT_GOODINFO_TABLE_SELECTOR;
use crate::data_source::FreshnessPolicy;
use crate::http_client::{DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use crate::pivot::{PivotVariant, Precision};
use crate::{ClassifierTable, CoreError, MarketAffiliation, SourceId, ValidationError};

pub const CONFIG_PATH_ENV: &str = "PIVOTICK_CONFIG";
pub const TIMEOUT_ENV: &str = "PIVOTICK_TIMEOUT_MS";
pub const VARIANT_ENV: &str = "PIVOTICK_VARIANT";
pub const PRECISION_ENV: &str = "PIVOTICK_PRECISION";
pub const FRESHNESS_ENV: &str = "PIVOTICK_FRESHNESS";

/// Deadline for one whole adapter attempt, request and parsing included.
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 8_000;

/// Adapter order per market affiliation.
///
/// Sources listed here but not registered with the resolver are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterPriority {
    pub primary: Vec<SourceId>,
    pub secondary: Vec<SourceId>,
    pub unknown: Vec<SourceId>,
}

impl Default for AdapterPriority {
    fn default() -> Self {
        Self {
            primary: vec![SourceId::Twse, SourceId::Goodinfo, SourceId::YahooTw],
            secondary: vec![SourceId::Tpex, SourceId::Goodinfo, SourceId::YahooTw],
            unknown: SourceId::ALL.to_vec(),
        }
    }
}

impl AdapterPriority {
    pub fn for_affiliation(&self, affiliation: MarketAffiliation) -> &[SourceId] {
        match affiliation {
            MarketAffiliation::Primary => &self.primary,
            MarketAffiliation::Secondary => &self.secondary,
            MarketAffiliation::Unknown => &self.unknown,
        }
    }
}

/// Immutable settings shared by every resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub adapter_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub variant: PivotVariant,
    pub precision: Precision,
    pub freshness: FreshnessPolicy,
    pub classifier: ClassifierTable,
    pub priority: AdapterPriority,
    pub goodinfo_selector: String,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: DEFAULT_ADAPTER_TIMEOUT_MS,
            http_timeout_ms: DEFAULT_TIMEOUT_MS,
            variant: PivotVariant::default(),
            precision: Precision::default(),
            freshness: FreshnessPolicy::default(),
            classifier: ClassifierTable::default(),
            priority: AdapterPriority::default(),
            goodinfo_selector: DEFAULT_GOODINFO_TABLE_SELECTOR.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ResolverConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints serde cannot express: both timeouts are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.adapter_timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: "adapter_timeout_ms",
            });
        }
        if self.http_timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: "http_timeout_ms",
            });
        }
        Ok(())
    }

    /// Resolve the configuration the way the CLI does: explicit path, else
    /// `PIVOTICK_CONFIG`, else defaults; then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides()?)
    }

    /// Apply the `PIVOTICK_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ValidationError> {
        self.with_overrides(|name| env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unset and blank variables leave the field unchanged; unparsable values
    /// are rejected rather than ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = read(TIMEOUT_ENV) {
            self.adapter_timeout_ms = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ValidationError::InvalidEnvValue {
                    name: TIMEOUT_ENV,
                    value,
                })?;
        }
        if let Some(value) = read(VARIANT_ENV) {
            self.variant = value.parse()?;
        }
        if let Some(value) = read(PRECISION_ENV) {
            let digits = value
                .trim()
                .parse::<u8>()
                .map_err(|_| ValidationError::InvalidEnvValue {
                    name: PRECISION_ENV,
                    value: value.clone(),
                })?;
            self.precision = Precision::new(digits)?;
        }
        if let Some(value) = read(FRESHNESS_ENV) {
            self.freshness = value.parse()?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: ResolverConfig = serde_json::from_str("{}").expect("empty config parses");
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.priority.primary[0], SourceId::Twse);
        assert_eq!(config.priority.secondary[0], SourceId::Tpex);
        assert_eq!(config.priority.unknown.len(), SourceId::ALL.len());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config: ResolverConfig = serde_json::from_str(
            r#"{"variant":"typical-half-distance","precision":2,"priority":{"primary":["yahoo_tw"]}}"#,
        )
        .expect("config parses");

        assert_eq!(config.variant, PivotVariant::TypicalHalfDistance);
        assert_eq!(config.precision.digits(), 2);
        assert_eq!(config.priority.primary, vec![SourceId::YahooTw]);
        assert_eq!(config.priority.secondary, AdapterPriority::default().secondary);
        assert_eq!(config.adapter_timeout_ms, DEFAULT_ADAPTER_TIMEOUT_MS);
    }

    #[test]
    fn rejects_out_of_range_precision_in_file() {
        let error = serde_json::from_str::<ResolverConfig>(r#"{"precision":9}"#)
            .expect_err("precision 9 must be rejected");
        assert!(error.to_string().contains("precision"));
    }

    #[test]
    fn zero_timeouts_fail_validation() {
        assert_eq!(ResolverConfig::default().validate(), Ok(()));

        let config: ResolverConfig =
            serde_json::from_str(r#"{"http_timeout_ms":0}"#).expect("config parses");
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroTimeout {
                field: "http_timeout_ms"
            })
        );

        let config: ResolverConfig =
            serde_json::from_str(r#"{"adapter_timeout_ms":0}"#).expect("config parses");
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroTimeout {
                field: "adapter_timeout_ms"
            })
        );
    }

    #[test]
    fn overrides_apply_on_top_of_file_values() {
        let config = ResolverConfig::default()
            .with_overrides(lookup(&[
                (TIMEOUT_ENV, "1500"),
                (VARIANT_ENV, "typical_full_range"),
                (PRECISION_ENV, "0"),
                (FRESHNESS_ENV, "require-session-date"),
            ]))
            .expect("overrides apply");

        assert_eq!(config.adapter_timeout_ms, 1_500);
        assert_eq!(config.variant, PivotVariant::TypicalFullRange);
        assert_eq!(config.precision.digits(), 0);
        assert_eq!(config.freshness, FreshnessPolicy::RequireSessionDate);
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = ResolverConfig::default()
            .with_overrides(lookup(&[(VARIANT_ENV, "  ")]))
            .expect("blank value is ignored");
        assert_eq!(config.variant, PivotVariant::Classic);
    }

    #[test]
    fn invalid_overrides_are_reported() {
        let error = ResolverConfig::default()
            .with_overrides(lookup(&[(TIMEOUT_ENV, "0")]))
            .expect_err("zero timeout must fail");
        assert_eq!(
            error,
            ValidationError::InvalidEnvValue {
                name: TIMEOUT_ENV,
                value: String::from("0"),
            }
        );

        let error = ResolverConfig::default()
            .with_overrides(lookup(&[(VARIANT_ENV, "fibonacci")]))
            .expect_err("unknown variant must fail");
        assert!(matches!(error, ValidationError::InvalidVariant { .. }));
    }
}
