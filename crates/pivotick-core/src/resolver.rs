//! Resolution orchestrator.
//!
//! ```text
//! identifier ─► StockId::parse ─► ClassifierTable ─► AdapterPriority
//!                    │                                      │
//!              InvalidInput                     adapter 1 ─► adapter 2 ─► …
//!                                                   │ first record passing validation
//!                                                   ▼
//!                                          compute_pivots ─► Success
//! ```
//!
//! Adapters run strictly one after another, each at most once per request
//! and each under its own deadline. When every listed adapter fails, the
//! collected attempts decide the outcome:
//!
//! | Attempts | Outcome |
//! |----------|---------|
//! | all `NotYetPublished`, or `NotYetPublished` mixed only with `Network` | `MarketNotYetPublished` |
//! | all `Network` (or none attempted) | `UpstreamError` |
//! | anything else | `NotFound` |

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use time::Date;
use tracing::{debug, info, warn};

use crate::adapters::{GoodinfoAdapter, TpexAdapter, TwseAdapter, YahooTwAdapter};
use crate::config::ResolverConfig;
use crate::data_source::{FetchError, FetchErrorKind, QuoteQuery, QuoteSource};
use crate::domain::session_date_now;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::pivot::{compute_pivots, PivotBands};
use crate::validation::validate;
use crate::{MarketAffiliation, SourceId, StockId, ValidatedRecord, ValidationError};

/// One failed adapter call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterAttempt {
    pub source: SourceId,
    pub error: FetchError,
}

/// A successfully resolved quote with its bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub stock_id: StockId,
    pub affiliation: MarketAffiliation,
    pub session_date: Date,
    pub source: SourceId,
    pub record: ValidatedRecord,
    pub bands: PivotBands,
    /// Failures of higher-priority adapters tried first.
    pub attempts: Vec<AdapterAttempt>,
}

/// Final result of one resolution. `resolve` never returns anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Success(Resolution),
    NotFound {
        attempts: Vec<AdapterAttempt>,
    },
    MarketNotYetPublished {
        attempts: Vec<AdapterAttempt>,
    },
    UpstreamError {
        attempts: Vec<AdapterAttempt>,
    },
    InvalidInput {
        #[serde(serialize_with = "serialize_display")]
        error: ValidationError,
    },
}

/// What the end user should do after a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserHint {
    /// Data for today is not out yet; ask again later.
    RetryLater,
    /// The code is malformed or unknown.
    CheckCode,
    /// Upstreams are unreachable right now.
    TryAgain,
}

impl ResolutionOutcome {
    /// Pick the outcome for a resolution where no adapter succeeded.
    pub fn from_failures(attempts: Vec<AdapterAttempt>) -> Self {
        let count = |kind: FetchErrorKind| {
            attempts
                .iter()
                .filter(|attempt| attempt.error.kind() == kind)
                .count()
        };
        let unpublished = count(FetchErrorKind::NotYetPublished);
        let network = count(FetchErrorKind::Network);

        if unpublished > 0 && unpublished + network == attempts.len() {
            Self::MarketNotYetPublished { attempts }
        } else if network == attempts.len() {
            Self::UpstreamError { attempts }
        } else {
            Self::NotFound { attempts }
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn status(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotFound { .. } => "not_found",
            Self::MarketNotYetPublished { .. } => "market_not_yet_published",
            Self::UpstreamError { .. } => "upstream_error",
            Self::InvalidInput { .. } => "invalid_input",
        }
    }

    pub fn user_hint(&self) -> Option<UserHint> {
        match self {
            Self::Success(_) => None,
            Self::MarketNotYetPublished { .. } => Some(UserHint::RetryLater),
            Self::NotFound { .. } | Self::InvalidInput { .. } => Some(UserHint::CheckCode),
            Self::UpstreamError { .. } => Some(UserHint::TryAgain),
        }
    }

    /// Adapter failures recorded during the resolution.
    pub fn attempts(&self) -> &[AdapterAttempt] {
        match self {
            Self::Success(resolution) => &resolution.attempts,
            Self::NotFound { attempts }
            | Self::MarketNotYetPublished { attempts }
            | Self::UpstreamError { attempts } => attempts,
            Self::InvalidInput { .. } => &[],
        }
    }
}

fn serialize_display<S>(error: &ValidationError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}

/// Stateless quote resolver: configuration plus adapter handles.
///
/// Cheap to share behind an `Arc`; concurrent resolutions need no locking.
pub struct Resolver {
    config: ResolverConfig,
    sources: HashMap<SourceId, Arc<dyn QuoteSource>>,
}

impl Resolver {
    pub fn new(config: ResolverConfig, sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        let sources = sources
            .into_iter()
            .map(|source| (source.id(), source))
            .collect();
        Self { config, sources }
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Registered adapters in canonical order.
    pub fn registered_sources(&self) -> Vec<SourceId> {
        let mut ids = self.sources.keys().copied().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn is_registered(&self, source: SourceId) -> bool {
        self.sources.contains_key(&source)
    }

    pub fn classify(&self, stock_id: &StockId) -> MarketAffiliation {
        self.config.classifier.classify(stock_id)
    }

    /// Adapter order for an affiliation, duplicates removed.
    pub fn priority_for(&self, affiliation: MarketAffiliation) -> Vec<SourceId> {
        let mut seen = HashSet::new();
        self.config
            .priority
            .for_affiliation(affiliation)
            .iter()
            .copied()
            .filter(|source| seen.insert(*source))
            .collect()
    }

    /// Resolve an identifier against today's Taipei session.
    pub async fn resolve(&self, identifier: &str) -> ResolutionOutcome {
        self.resolve_on(identifier, session_date_now()).await
    }

    /// Resolve an identifier for an explicit session date.
    pub async fn resolve_on(&self, identifier: &str, session_date: Date) -> ResolutionOutcome {
        let stock_id = match StockId::parse(identifier) {
            Ok(stock_id) => stock_id,
            Err(error) => {
                debug!(identifier, %error, "rejected identifier before any fetch");
                return ResolutionOutcome::InvalidInput { error };
            }
        };

        let affiliation = self.classify(&stock_id);
        let query = QuoteQuery::new(stock_id.clone(), affiliation, session_date)
            .with_freshness(self.config.freshness);
        let deadline = Duration::from_millis(self.config.adapter_timeout_ms);

        let mut attempts = Vec::new();
        let mut exhausted = HashSet::new();

        for source_id in self.priority_for(affiliation) {
            let Some(adapter) = self.sources.get(&source_id) else {
                warn!(source = %source_id, "listed source is not registered, skipping");
                continue;
            };
            if exhausted.contains(&adapter.scope()) {
                debug!(source = %source_id, "upstream already reported no such identifier, skipping");
                continue;
            }

            match self.attempt(adapter.as_ref(), &query, deadline).await {
                Ok(record) => {
                    if !attempts.is_empty() {
                        info!(
                            stock_id = %stock_id,
                            source = %source_id,
                            failed_attempts = attempts.len(),
                            "source fallback succeeded"
                        );
                    }
                    let bands = compute_pivots(&record, self.config.variant, self.config.precision);
                    return ResolutionOutcome::Success(Resolution {
                        stock_id,
                        affiliation,
                        session_date,
                        source: source_id,
                        record,
                        bands,
                        attempts,
                    });
                }
                Err(error) => {
                    warn!(
                        stock_id = %stock_id,
                        source = %source_id,
                        error = %error,
                        "source attempt failed"
                    );
                    if error.kind() == FetchErrorKind::NoSuchIdentifier {
                        exhausted.insert(adapter.scope());
                    }
                    attempts.push(AdapterAttempt {
                        source: source_id,
                        error,
                    });
                }
            }
        }

        let outcome = ResolutionOutcome::from_failures(attempts);
        info!(
            stock_id = %stock_id,
            affiliation = %affiliation,
            status = outcome.status(),
            "all sources failed"
        );
        outcome
    }

    async fn attempt(
        &self,
        adapter: &dyn QuoteSource,
        query: &QuoteQuery,
        deadline: Duration,
    ) -> Result<ValidatedRecord, FetchError> {
        let raw = match tokio::time::timeout(deadline, adapter.fetch(query)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::network(format!(
                    "{} exceeded the {}ms adapter deadline",
                    adapter.id(),
                    deadline.as_millis()
                )))
            }
        };
        validate(raw).map_err(|error| FetchError::validation(&error))
    }
}

/// Builder wiring the stock adapters to one shared HTTP client.
///
/// # Example
///
/// ```rust,ignore
/// use pivotick_core::{Resolver, ResolverConfig};
///
/// let resolver = Resolver::builder()
///     .with_config(ResolverConfig::load(None)?)
///     .build();
/// let outcome = resolver.resolve("2330").await;
/// ```
#[derive(Default)]
pub struct ResolverBuilder {
    config: ResolverConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    extra_sources: Vec<Arc<dyn QuoteSource>>,
    skip_stock_sources: bool,
}

impl ResolverBuilder {
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Share this transport between the stock adapters instead of a
    /// `reqwest` client built from the configured user agent.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Register an additional adapter. It replaces a stock adapter with the
    /// same id.
    pub fn with_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.extra_sources.push(source);
        self
    }

    /// Register only the given adapters, leaving the stock ones out.
    pub fn with_sources(mut self, sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        self.extra_sources = sources;
        self.skip_stock_sources = true;
        self
    }

    pub fn build(self) -> Resolver {
        let mut sources: Vec<Arc<dyn QuoteSource>> = Vec::new();

        if !self.skip_stock_sources {
            let http_client = self.http_client.unwrap_or_else(|| {
                Arc::new(ReqwestHttpClient::with_user_agent(&self.config.user_agent))
            });
            let timeout_ms = self.config.http_timeout_ms;
            sources.push(Arc::new(
                TwseAdapter::new(http_client.clone()).with_timeout_ms(timeout_ms),
            ));
            sources.push(Arc::new(
                TpexAdapter::new(http_client.clone()).with_timeout_ms(timeout_ms),
            ));
            sources.push(Arc::new(
                GoodinfoAdapter::new(http_client.clone())
                    .with_table_selector(self.config.goodinfo_selector.clone())
                    .with_timeout_ms(timeout_ms),
            ));
            sources.push(Arc::new(
                YahooTwAdapter::new(http_client).with_timeout_ms(timeout_ms),
            ));
        }

        sources.extend(self.extra_sources);
        Resolver::new(self.config, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::FetchFuture;
    use crate::RawRecord;
    use time::macros::date;

    struct Scripted {
        id: SourceId,
        result: Result<RawRecord, FetchError>,
    }

    impl QuoteSource for Scripted {
        fn id(&self) -> SourceId {
            self.id
        }

        fn fetch<'a>(&'a self, _query: &'a QuoteQuery) -> FetchFuture<'a> {
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn failing(id: SourceId, error: FetchError) -> Arc<dyn QuoteSource> {
        Arc::new(Scripted {
            id,
            result: Err(error),
        })
    }

    fn attempt(kind: FetchErrorKind) -> AdapterAttempt {
        AdapterAttempt {
            source: SourceId::Twse,
            error: FetchError::new(kind, "scripted"),
        }
    }

    #[test]
    fn aggregates_failure_mixes() {
        use FetchErrorKind::{Network, NoSuchIdentifier, NotYetPublished, Parse};

        let outcome = ResolutionOutcome::from_failures(vec![attempt(NotYetPublished), attempt(Network)]);
        assert_eq!(outcome.status(), "market_not_yet_published");
        assert_eq!(outcome.user_hint(), Some(UserHint::RetryLater));

        let outcome = ResolutionOutcome::from_failures(vec![attempt(Network), attempt(Network)]);
        assert_eq!(outcome.user_hint(), Some(UserHint::TryAgain));

        let outcome = ResolutionOutcome::from_failures(vec![attempt(NotYetPublished), attempt(Parse)]);
        assert_eq!(outcome.status(), "not_found");

        let outcome = ResolutionOutcome::from_failures(vec![attempt(NoSuchIdentifier), attempt(Network)]);
        assert_eq!(outcome.user_hint(), Some(UserHint::CheckCode));

        assert_eq!(ResolutionOutcome::from_failures(Vec::new()).status(), "upstream_error");
    }

    #[tokio::test]
    async fn falls_back_to_the_next_listed_source() {
        let resolver = Resolver::builder()
            .with_sources(vec![
                failing(SourceId::Twse, FetchError::network("connection refused")),
                Arc::new(Scripted {
                    id: SourceId::Goodinfo,
                    result: Ok(RawRecord::new(110.0, 90.0, 100.0, SourceId::Goodinfo)),
                }),
            ])
            .build();

        let outcome = resolver.resolve_on("2330", date!(2024 - 01 - 05)).await;
        let ResolutionOutcome::Success(resolution) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(resolution.source, SourceId::Goodinfo);
        assert_eq!(resolution.affiliation, MarketAffiliation::Primary);
        assert_eq!(resolution.attempts.len(), 1);
        assert_eq!(resolution.bands.cdp, 100.0);
        assert_eq!(resolution.bands.ah, 120.0);
    }

    #[tokio::test]
    async fn invalid_record_counts_as_validation_failure() {
        let resolver = Resolver::builder()
            .with_sources(vec![Arc::new(Scripted {
                id: SourceId::Twse,
                result: Ok(RawRecord::new(90.0, 110.0, 100.0, SourceId::Twse)),
            })])
            .build();

        let outcome = resolver.resolve_on("2330", date!(2024 - 01 - 05)).await;
        assert_eq!(outcome.status(), "not_found");
        assert_eq!(outcome.attempts()[0].error.kind(), FetchErrorKind::Validation);
    }

    #[test]
    fn serializes_with_status_tag() {
        let outcome = ResolutionOutcome::InvalidInput {
            error: ValidationError::EmptyIdentifier,
        };
        let json = serde_json::to_value(&outcome).expect("outcome serializes");
        assert_eq!(json["status"], "invalid_input");
        assert_eq!(json["error"], "stock id cannot be empty");
    }

    #[test]
    fn priority_drops_duplicates() {
        let mut config = ResolverConfig::default();
        config.priority.primary = vec![SourceId::Twse, SourceId::YahooTw, SourceId::Twse];
        let resolver = Resolver::builder().with_config(config).with_sources(Vec::new()).build();

        assert_eq!(
            resolver.priority_for(MarketAffiliation::Primary),
            vec![SourceId::Twse, SourceId::YahooTw]
        );
        assert!(resolver.registered_sources().is_empty());
    }
}
