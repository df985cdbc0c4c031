mod classify;
mod pivots;
mod quote;
mod sources;

use std::sync::Arc;

use pivotick_core::{Precision, ResolutionOutcome, Resolver, ResolverConfig, StaticHttpClient};
use serde::Serialize;

use crate::cli::{Cli, Command, PivotArgs};
use crate::error::CliError;

pub use classify::ClassificationReport;
pub use pivots::PivotsReport;
pub use sources::SourcesReport;

/// Result of one command, rendered by [`crate::output`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Quote(ResolutionOutcome),
    Pivots(PivotsReport),
    Classification(ClassificationReport),
    Sources(SourcesReport),
}

impl Report {
    /// Process exit code: 0 ok, 2 invalid input, 3 not found,
    /// 4 not yet published, 5 upstream error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Quote(outcome) => match outcome {
                ResolutionOutcome::Success(_) => 0,
                ResolutionOutcome::InvalidInput { .. } => 2,
                ResolutionOutcome::NotFound { .. } => 3,
                ResolutionOutcome::MarketNotYetPublished { .. } => 4,
                ResolutionOutcome::UpstreamError { .. } => 5,
            },
            Self::Pivots(_) | Self::Classification(_) | Self::Sources(_) => 0,
        }
    }
}

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let mut config = ResolverConfig::load(cli.config.as_deref())?;
    apply_timeout(&mut config, cli.timeout_ms);

    match &cli.command {
        Command::Quote(args) => quote::run(args, config, cli.offline).await,
        Command::Pivots(args) => pivots::run(args, config),
        Command::Classify(args) => classify::run(args, &build_resolver(config, cli.offline)),
        Command::Sources => Ok(sources::run(&build_resolver(config, cli.offline))),
    }
}

/// `--timeout-ms` replaces the adapter deadline and caps the per-request timeout.
fn apply_timeout(config: &mut ResolverConfig, timeout_ms: Option<u64>) {
    if let Some(timeout_ms) = timeout_ms {
        config.adapter_timeout_ms = timeout_ms;
        config.http_timeout_ms = config.http_timeout_ms.min(timeout_ms);
    }
}

fn apply_pivot_args(config: &mut ResolverConfig, args: &PivotArgs) -> Result<(), CliError> {
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(digits) = args.precision {
        config.precision = Precision::new(digits)?;
    }
    Ok(())
}

fn build_resolver(config: ResolverConfig, offline: bool) -> Resolver {
    let builder = Resolver::builder().with_config(config);
    if offline {
        builder.with_http_client(Arc::new(StaticHttpClient::new())).build()
    } else {
        builder.build()
    }
}
