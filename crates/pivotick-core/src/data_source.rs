//! Adapter contract and failure taxonomy.
//!
//! Every upstream shape is wrapped by one [`QuoteSource`] implementation.
//! Adapters never panic on upstream data: each problem is reported as a
//! [`FetchError`] whose [`FetchErrorKind`] tells the resolver how to proceed.
//!
//! | Kind | Meaning | Retry later today? |
//! |------|---------|--------------------|
//! | `Network` | timeout, connection failure, non-2xx status | yes |
//! | `Parse` | expected structure missing or changed | no |
//! | `NoSuchIdentifier` | upstream definitively lacks the code | no |
//! | `NotYetPublished` | upstream has no record for the session yet | yes |
//! | `Validation` | record parsed but violates OHLC invariants | no |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{MarketAffiliation, RawRecord, SourceId, StockId, Upstream, ValidationError};

/// Whether a record from an earlier session is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FreshnessPolicy {
    /// Use the most recent record the upstream has.
    #[default]
    LatestAvailable,
    /// Only accept a record dated on the query's session date.
    RequireSessionDate,
}

impl FromStr for FreshnessPolicy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "latest-available" | "latest" => Ok(Self::LatestAvailable),
            "require-session-date" | "session" => Ok(Self::RequireSessionDate),
            other => Err(ValidationError::InvalidFreshness {
                value: other.to_owned(),
            }),
        }
    }
}

/// Input handed to every adapter for one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteQuery {
    pub stock_id: StockId,
    pub affiliation: MarketAffiliation,
    pub session_date: Date,
    pub freshness: FreshnessPolicy,
}

impl QuoteQuery {
    pub fn new(stock_id: StockId, affiliation: MarketAffiliation, session_date: Date) -> Self {
        Self {
            stock_id,
            affiliation,
            session_date,
            freshness: FreshnessPolicy::default(),
        }
    }

    pub fn with_freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }

    /// Apply the freshness policy to a record an adapter extracted.
    pub fn check_freshness(&self, record: RawRecord) -> Result<RawRecord, FetchError> {
        if self.freshness == FreshnessPolicy::LatestAvailable {
            return Ok(record);
        }

        match record.as_of {
            Some(as_of) if as_of < self.session_date => Err(FetchError::not_yet_published(format!(
                "latest {} record is dated {as_of}, session is {}",
                record.source, self.session_date
            ))),
            _ => Ok(record),
        }
    }
}

/// Adapter-level failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Network,
    Parse,
    NoSuchIdentifier,
    NotYetPublished,
    Validation,
}

impl FetchErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "fetch.network",
            Self::Parse => "fetch.parse",
            Self::NoSuchIdentifier => "fetch.no_such_identifier",
            Self::NotYetPublished => "fetch.not_yet_published",
            Self::Validation => "fetch.validation",
        }
    }

    /// True when asking again later the same day may succeed.
    pub const fn retryable_later(self) -> bool {
        matches!(self, Self::Network | Self::NotYetPublished)
    }
}

/// Structured adapter failure used by resolver fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Parse, message)
    }

    pub fn no_such_identifier(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NoSuchIdentifier, message)
    }

    pub fn not_yet_published(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotYetPublished, message)
    }

    pub fn validation(error: &ValidationError) -> Self {
        Self::new(FetchErrorKind::Validation, error.to_string())
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

impl From<ValidationError> for FetchError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::NotNumeric { .. } => Self::parse(error.to_string()),
            other => Self::validation(&other),
        }
    }
}

/// Boxed future returned by [`QuoteSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<RawRecord, FetchError>> + Send + 'a>>;

/// Source adapter contract.
///
/// One implementation per upstream shape. Implementations hold no
/// per-request state, so a single instance serves concurrent resolutions.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use pivotick_core::{FetchFuture, QuoteQuery, QuoteSource, RawRecord, SourceId};
///
/// struct FixedSource;
///
/// impl QuoteSource for FixedSource {
///     fn id(&self) -> SourceId {
///         SourceId::Twse
///     }
///
///     fn fetch<'a>(&'a self, query: &'a QuoteQuery) -> FetchFuture<'a> {
///         Box::pin(async move { Ok(RawRecord::new(105.0, 95.0, 100.0, self.id())) })
///     }
/// }
/// ```
pub trait QuoteSource: Send + Sync {
    /// Returns the adapter identifier.
    fn id(&self) -> SourceId;

    /// Upstream service this adapter talks to.
    fn scope(&self) -> Upstream {
        self.id().upstream()
    }

    /// Fetch the daily record for the queried identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] classified per the module table. Network calls
    /// are bounded by a timeout and report expiry as
    /// [`FetchErrorKind::Network`].
    fn fetch<'a>(&'a self, query: &'a QuoteQuery) -> FetchFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn query(freshness: FreshnessPolicy) -> QuoteQuery {
        QuoteQuery::new(
            StockId::parse("2330").expect("valid id"),
            MarketAffiliation::Primary,
            date!(2024 - 01 - 05),
        )
        .with_freshness(freshness)
    }

    #[test]
    fn latest_available_accepts_stale_records() {
        let record = RawRecord::new(10.0, 9.0, 9.5, SourceId::Twse).with_as_of(date!(2024 - 01 - 04));
        assert!(query(FreshnessPolicy::LatestAvailable).check_freshness(record).is_ok());
    }

    #[test]
    fn session_policy_reports_stale_records_as_not_yet_published() {
        let stale = RawRecord::new(10.0, 9.0, 9.5, SourceId::Twse).with_as_of(date!(2024 - 01 - 04));
        let error = query(FreshnessPolicy::RequireSessionDate)
            .check_freshness(stale)
            .expect_err("stale record must be rejected");
        assert_eq!(error.kind(), FetchErrorKind::NotYetPublished);

        let current = RawRecord::new(10.0, 9.0, 9.5, SourceId::Twse).with_as_of(date!(2024 - 01 - 05));
        assert!(query(FreshnessPolicy::RequireSessionDate).check_freshness(current).is_ok());

        let undated = RawRecord::new(10.0, 9.0, 9.5, SourceId::YahooTw);
        assert!(query(FreshnessPolicy::RequireSessionDate).check_freshness(undated).is_ok());
    }

    #[test]
    fn only_network_and_unpublished_are_retryable_later() {
        assert!(FetchErrorKind::Network.retryable_later());
        assert!(FetchErrorKind::NotYetPublished.retryable_later());
        assert!(!FetchErrorKind::Parse.retryable_later());
        assert!(!FetchErrorKind::NoSuchIdentifier.retryable_later());
        assert!(!FetchErrorKind::Validation.retryable_later());
    }

    #[test]
    fn numeric_failures_convert_to_parse_errors() {
        let error = FetchError::from(ValidationError::NotNumeric {
            value: String::from("--"),
        });
        assert_eq!(error.kind(), FetchErrorKind::Parse);
        assert_eq!(error.code(), "fetch.parse");
    }
}
