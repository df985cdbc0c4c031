//! # Pivotick Core
//!
//! Quote resolution and CDP pivot calculation for Taiwan-listed stocks.
//!
//! ## Overview
//!
//! Given a stock code typed by a user, the core:
//!
//! - **Classifies** the code to a market board from a prefix table
//! - **Fetches** the latest daily high/low/close from several upstreams,
//!   falling back in a configured order
//! - **Validates** the record against OHLC invariants
//! - **Computes** next-session support/resistance bands with a chosen
//!   pivot formula
//!
//! The core keeps no state between requests.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Upstream adapters (TWSE, TPEx, Goodinfo, Yahoo Taiwan) |
//! | [`config`] | Resolver configuration (JSON file + environment) |
//! | [`data_source`] | Adapter trait, query and failure taxonomy |
//! | [`domain`] | Stock id, raw/validated records, session dates |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`market`] | Market board classification |
//! | [`numeric`] | Locale-formatted number parsing |
//! | [`pivot`] | Pivot-band formulas |
//! | [`resolver`] | Priority-ordered resolution and outcome aggregation |
//! | [`source`] | Adapter identifiers and upstream scopes |
//! | [`validation`] | Record validation |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pivotick_core::{ResolutionOutcome, Resolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = Resolver::builder()
//!         .with_config(ResolverConfig::load(None)?)
//!         .build();
//!
//!     if let ResolutionOutcome::Success(resolution) = resolver.resolve("2330").await {
//!         println!("CDP {:.1}", resolution.bands.cdp);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Bot / CLI      │
//! └────────┬────────┘
//!          │ raw identifier
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Resolver       │────▶│ ClassifierTable  │
//! └────────┬────────┘     └──────────────────┘
//!          │ priority order
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ QuoteSource     │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest/static) │
//! └────────┬────────┘     └──────────────────┘
//!          │ RawRecord
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ validate        │────▶│ compute_pivots   │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapters never panic on upstream data; each failure is a classified
//! [`FetchError`]. Only the resolver decides the final outcome:
//!
//! ```rust
//! use pivotick_core::{ResolutionOutcome, UserHint};
//!
//! fn reply(outcome: &ResolutionOutcome) -> &'static str {
//!     match outcome.user_hint() {
//!         None => "ok",
//!         Some(UserHint::RetryLater) => "today's data is not out yet",
//!         Some(UserHint::CheckCode) => "check the stock code",
//!         Some(UserHint::TryAgain) => "upstreams unavailable, try again",
//!     }
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market;
pub mod numeric;
pub mod pivot;
pub mod resolver;
pub mod source;
pub mod validation;

#[cfg(test)]
mod test_support;

// Adapter implementations
pub use adapters::{
    GoodinfoAdapter, TpexAdapter, TwseAdapter, YahooTwAdapter, DEFAULT_GOODINFO_TABLE_SELECTOR,
};

// Configuration
pub use config::{AdapterPriority, ResolverConfig};

// Adapter contract
pub use data_source::{
    FetchError, FetchErrorKind, FetchFuture, FreshnessPolicy, QuoteQuery, QuoteSource,
};

// Domain models
pub use domain::{
    parse_exchange_date, previous_month, session_date_at, session_date_now, RawRecord, StockId,
    ValidatedRecord, TAIPEI_OFFSET_HOURS,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
};

// Classification
pub use market::{ClassifierTable, MarketAffiliation, PrefixRule};

pub use numeric::normalize;

// Pivot calculation
pub use pivot::{compute_pivots, compute_pivots_from_prices, PivotBands, PivotVariant, Precision};

// Resolution
pub use resolver::{
    AdapterAttempt, Resolution, ResolutionOutcome, Resolver, ResolverBuilder, UserHint,
};

// Source identifiers
pub use source::{SourceId, Upstream};

pub use validation::{check_prices, validate};
