use serde::Serialize;

use pivotick_core::{MarketAffiliation, Resolver, SourceId, StockId};

use crate::cli::ClassifyArgs;
use crate::error::CliError;

use super::Report;

#[derive(Debug, Serialize)]
pub struct ClassificationReport {
    pub stock_id: StockId,
    pub affiliation: MarketAffiliation,
    pub priority: Vec<SourceId>,
}

pub fn run(args: &ClassifyArgs, resolver: &Resolver) -> Result<Report, CliError> {
    let stock_id = StockId::parse(&args.id)?;
    let affiliation = resolver.classify(&stock_id);

    Ok(Report::Classification(ClassificationReport {
        priority: resolver.priority_for(affiliation),
        stock_id,
        affiliation,
    }))
}
