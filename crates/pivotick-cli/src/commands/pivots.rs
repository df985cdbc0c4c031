use serde::Serialize;

use pivotick_core::{compute_pivots_from_prices, PivotBands, ResolverConfig};

use crate::cli::PivotsArgs;
use crate::error::CliError;

use super::{apply_pivot_args, Report};

#[derive(Debug, Serialize)]
pub struct PivotsReport {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub bands: PivotBands,
}

pub fn run(args: &PivotsArgs, mut config: ResolverConfig) -> Result<Report, CliError> {
    apply_pivot_args(&mut config, &args.pivot)?;

    let bands = compute_pivots_from_prices(
        args.high,
        args.low,
        args.close,
        config.variant,
        config.precision,
    )?;

    Ok(Report::Pivots(PivotsReport {
        high: args.high,
        low: args.low,
        close: args.close,
        bands,
    }))
}
