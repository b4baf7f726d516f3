//! Merging per-file batches into the canonical dataset.
//!
//! Timestamps are already normalised to [`chrono::NaiveDateTime`] by the row
//! validator, so merging is a concatenation in file-discovery order plus the
//! non-empty check that makes an empty run fatal.

use std::collections::BTreeSet;
use std::fmt;

use energy_core::error::{EnergyError, Result};
use energy_core::models::{canonical_cmp, sum_kwh, ReadingRecord};
use tracing::{info, warn};

use crate::reader::LoadOutcome;

// ── CanonicalDataset ──────────────────────────────────────────────────────────

/// All valid readings of one pipeline run. Never empty.
#[derive(Debug, Clone)]
pub struct CanonicalDataset {
    records: Vec<ReadingRecord>,
}

impl CanonicalDataset {
    /// Wrap `records`, or `None` when there are none.
    pub fn new(records: Vec<ReadingRecord>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    /// Readings in insertion (file-discovery) order.
    pub fn records(&self) -> &[ReadingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Readings sorted by timestamp ascending, stable for equal timestamps.
    pub fn time_ordered(&self) -> Vec<&ReadingRecord> {
        let mut ordered: Vec<&ReadingRecord> = self.records.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);
        ordered
    }

    /// Distinct building identifiers, sorted.
    pub fn buildings(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.building.as_str()).collect()
    }

    /// Sum of every reading, independent of file order.
    pub fn total_kwh(&self) -> f64 {
        let mut all: Vec<&ReadingRecord> = self.records.iter().collect();
        sum_kwh(&mut all)
    }

    /// The reading with the largest `kwh`.
    ///
    /// Ties go to the earliest timestamp, then the first building by name.
    pub fn peak_reading(&self) -> &ReadingRecord {
        let mut peak = &self.records[0];
        for r in &self.records[1..] {
            let better = match r.kwh.total_cmp(&peak.kwh) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => canonical_cmp(r, peak).is_lt(),
                std::cmp::Ordering::Less => false,
            };
            if better {
                peak = r;
            }
        }
        peak
    }
}

// ── IngestSummary ─────────────────────────────────────────────────────────────

/// Diagnostics gathered while loading and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files_attempted: usize,
    pub files_loaded: usize,
    pub rows_kept: usize,
    pub rows_rejected: usize,
    /// One human-readable message per skipped file.
    pub errors: Vec<String>,
}

impl IngestSummary {
    pub fn from_outcome(outcome: &LoadOutcome) -> Self {
        Self {
            files_attempted: outcome.files_attempted,
            files_loaded: outcome.batches.len(),
            rows_kept: outcome.rows_kept(),
            rows_rejected: outcome.rows_rejected(),
            errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn files_failed(&self) -> usize {
        self.files_attempted.saturating_sub(self.files_loaded)
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} files loaded, {} readings kept, {} rows rejected",
            self.files_loaded, self.files_attempted, self.rows_kept, self.rows_rejected
        )
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Concatenate every batch of `outcome` into the canonical dataset.
///
/// Fails with [`EnergyError::NoValidData`] when no reading survived, either
/// because nothing matched or because every file was rejected.
pub fn merge(outcome: LoadOutcome) -> Result<(CanonicalDataset, IngestSummary)> {
    let summary = IngestSummary::from_outcome(&outcome);
    for message in &summary.errors {
        warn!("Skipped source: {}", message);
    }

    let records: Vec<ReadingRecord> = outcome
        .batches
        .into_iter()
        .flat_map(|b| b.records)
        .collect();

    let dataset = CanonicalDataset::new(records).ok_or_else(|| EnergyError::NoValidData {
        data_dir: outcome.data_dir.clone(),
        files_attempted: outcome.files_attempted,
    })?;

    info!("Data loaded: {}", summary);
    Ok((dataset, summary))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
