use serde::Serialize;

use pivotick_core::{MarketAffiliation, Resolver, SourceId, Upstream};

use super::Report;

#[derive(Debug, Serialize)]
pub struct SourceEntry {
    pub id: SourceId,
    pub upstream: Upstream,
    pub registered: bool,
}

#[derive(Debug, Serialize)]
pub struct BoardPriority {
    pub affiliation: MarketAffiliation,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Serialize)]
pub struct SourcesReport {
    pub boards: Vec<BoardPriority>,
}

pub fn run(resolver: &Resolver) -> Report {
    let boards = MarketAffiliation::ALL
        .into_iter()
        .map(|affiliation| BoardPriority {
            affiliation,
            sources: resolver
                .priority_for(affiliation)
                .into_iter()
                .map(|id| SourceEntry {
                    id,
                    upstream: id.upstream(),
                    registered: resolver.is_registered(id),
                })
                .collect(),
        })
        .collect();

    Report::Sources(SourcesReport { boards })
}
