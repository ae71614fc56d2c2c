//! # Aggregator/Joiner
//! Pure logic that maps normalized route pairs + a GDP snapshot to the final
//! per-country metrics table. No I/O, suitable for unit tests and offline
//! evaluation.
//!
//! Rows materialize only for countries with at least one mention; the GDP
//! join is a left join, so a missing value never drops a row. Output is
//! deterministic for fixed inputs; row order carries no meaning.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::gdp::GdpTable;

/// Normalized route: either side is `None` when extraction or normalization
/// rejected that span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPair {
    pub source: Option<String>,
    pub destination: Option<String>,
}

/// One row of the joined output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryMetricsRow {
    pub country: String,
    pub leaving_mentions: u32,
    pub moving_to_mentions: u32,
    pub gdp_per_capita: Option<f64>,
}

/// Count leaving/moving-to mentions per country and left-join GDP values.
pub fn aggregate(pairs: &[NormalizedPair], gdp: &GdpTable) -> Vec<CountryMetricsRow> {
    // BTreeMap keeps accumulation order stable across runs.
    let mut counts: BTreeMap<&str, (u32, u32)> = BTreeMap::new();

    for pair in pairs {
        if let Some(src) = pair.source.as_deref() {
            counts.entry(src).or_default().0 += 1;
        }
        if let Some(dst) = pair.destination.as_deref() {
            counts.entry(dst).or_default().1 += 1;
        }
    }

    counts
        .into_iter()
        .map(|(country, (leaving, moving))| CountryMetricsRow {
            country: country.to_string(),
            leaving_mentions: leaving,
            moving_to_mentions: moving,
            gdp_per_capita: gdp.value_for(country),
        })
        .collect()
}
