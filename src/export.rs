//! CSV export of the metrics table for the presentation layer.
//! Header row, one line per country, no index column; absent GDP serializes
//! as an empty field. World Bank names contain commas ("Korea, Rep."), so
//! quoting matters.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::aggregate::CountryMetricsRow;

pub fn rows_to_csv(rows: &[CountryMetricsRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).context("serializing metrics row")?;
    }
    // An empty table still gets its header.
    if rows.is_empty() {
        wtr.write_record([
            "country",
            "leaving_mentions",
            "moving_to_mentions",
            "gdp_per_capita",
        ])
        .context("writing csv header")?;
    }
    let bytes = wtr.into_inner().context("flushing csv writer")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// Download filename in the UI's convention, e.g. `migration_analysis_20250825.csv`.
pub fn export_filename() -> String {
    format!("migration_analysis_{}.csv", Utc::now().format("%Y%m%d"))
}
