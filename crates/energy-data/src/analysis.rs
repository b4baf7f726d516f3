//! End-to-end ingestion and aggregation.
//!
//! Runs load → merge → aggregate and returns an [`AnalysisResult`] for the
//! report writers.

use std::path::Path;
use std::time::Instant;

use energy_core::error::Result;
use tracing::info;

use crate::aggregator::{AggregateTables, EnergyAggregator};
use crate::merger::{merge, CanonicalDataset, IngestSummary};
use crate::reader::{load_sources, LoadOutcome};

// ── Public types ──────────────────────────────────────────────────────────────

/// Timing of one analysis run; never written into artifacts.
#[derive(Debug, Clone, Default)]
pub struct AnalysisMetadata {
    /// Wall-clock seconds spent discovering and parsing source files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent merging and aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub dataset: CanonicalDataset,
    pub tables: AggregateTables,
    pub ingest: IngestSummary,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Sum of every reading in the run.
    pub fn total_campus_consumption(&self) -> f64 {
        self.dataset.total_kwh()
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over the source files in `data_dir`.
///
/// 1. Load every `*.{extension}` file, skipping unreadable ones.
/// 2. Merge the batches; fail when no reading survived.
/// 3. Compute daily, weekly and per-building tables.
pub fn analyze_directory(data_dir: &Path, extension: &str) -> Result<AnalysisResult> {
    let load_start = Instant::now();
    let outcome = load_sources(data_dir, extension);
    let load_time = load_start.elapsed().as_secs_f64();

    let mut result = analyze_outcome(outcome)?;
    result.metadata.load_time_seconds = load_time;
    Ok(result)
}

/// Merge and aggregate an already loaded [`LoadOutcome`].
pub fn analyze_outcome(outcome: LoadOutcome) -> Result<AnalysisResult> {
    let start = Instant::now();
    let (dataset, ingest) = merge(outcome)?;
    let tables = EnergyAggregator::compute(&dataset);

    info!(
        "Aggregated {} readings into {} days, {} weeks, {} buildings",
        dataset.len(),
        tables.daily_totals.len(),
        tables.weekly_totals.len(),
        tables.building_summary.len(),
    );

    Ok(AnalysisResult {
        dataset,
        tables,
        ingest,
        metadata: AnalysisMetadata {
            load_time_seconds: 0.0,
            aggregate_time_seconds: start.elapsed().as_secs_f64(),
        },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
