//! Tabular and plain-text renderings of an analysis run.
//!
//! Renderers return the artifact bytes; writing them to disk is left to
//! [`crate::write_artifacts`].

use std::collections::BTreeMap;

use energy_core::error::Result;
use energy_core::formatting::{format_kwh, format_total_kwh};
use energy_core::models::BuildingStats;
use energy_core::time_utils::format_timestamp;
use energy_data::aggregator::AggregateTables;
use energy_data::merger::CanonicalDataset;

/// Render the merged dataset as `timestamp,kwh,building`, time-ordered.
pub fn render_cleaned_dataset(dataset: &CanonicalDataset) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["timestamp", "kwh", "building"])?;
    for r in dataset.time_ordered() {
        wtr.write_record([
            format_timestamp(&r.timestamp),
            format_kwh(r.kwh),
            r.building.clone(),
        ])?;
    }
    finish(wtr)
}

/// Render the per-building table as `building,mean,min,max,total`.
pub fn render_building_summary(summary: &BTreeMap<String, BuildingStats>) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["building", "mean", "min", "max", "total"])?;
    for (name, s) in summary {
        wtr.write_record([
            name.clone(),
            format_kwh(s.mean),
            format_kwh(s.min),
            format_kwh(s.max),
            format_kwh(s.total),
        ])?;
    }
    finish(wtr)
}

/// Render the plain-text campus summary.
///
/// Contains no generation time, so unchanged input renders identical bytes.
pub fn render_summary_text(
    dataset: &CanonicalDataset,
    tables: &AggregateTables,
    dashboard_name: Option<&str>,
) -> String {
    let total = dataset.total_kwh();
    let highest = tables
        .highest_consuming_building()
        .map(|(name, _)| name)
        .unwrap_or("n/a");
    let peak = dataset.peak_reading();

    let mut text = String::new();
    text.push_str("Campus Energy Summary Report\n");
    text.push_str("-----------------------------------------\n");
    text.push_str(&format!(
        "Total Campus Consumption: {}\n",
        format_total_kwh(total)
    ));
    text.push_str(&format!("Highest Consuming Building: {}\n", highest));
    text.push_str(&format!(
        "Peak Load Time: {} (Value: {} kWh)\n",
        format_timestamp(&peak.timestamp),
        format_kwh(peak.kwh)
    ));
    text.push('\n');
    text.push_str("Daily & Weekly Trends:\n");
    text.push_str("- Daily totals and weekly aggregates generated.\n");
    match dashboard_name {
        Some(name) => text.push_str(&format!("- Visual dashboard saved as {}.\n", name)),
        None => text.push_str("- Visual dashboard not generated.\n"),
    }
    text
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}
