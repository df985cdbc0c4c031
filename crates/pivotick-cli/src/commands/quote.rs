use pivotick_core::FreshnessPolicy;
use pivotick_core::ResolverConfig;

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::{apply_pivot_args, build_resolver, Report};

pub async fn run(args: &QuoteArgs, mut config: ResolverConfig, offline: bool) -> Result<Report, CliError> {
    apply_pivot_args(&mut config, &args.pivot)?;
    if args.require_session_date {
        config.freshness = FreshnessPolicy::RequireSessionDate;
    }

    let resolver = build_resolver(config, offline);
    Ok(Report::Quote(resolver.resolve(&args.id).await))
}
