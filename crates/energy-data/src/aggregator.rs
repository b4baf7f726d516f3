//! Daily, weekly and per-building aggregation.
//!
//! Every bucket is summed in canonical reading order (see
//! [`energy_core::models::canonical_cmp`]), so results do not depend on the
//! order source files were discovered in. Buckets without readings produce no
//! row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use energy_core::models::{sum_kwh, BuildingStats, PeriodTotal, ReadingRecord};
use energy_core::time_utils::week_ending;

use crate::merger::CanonicalDataset;

// ── AggregateTables ───────────────────────────────────────────────────────────

/// The three tables the report and charts are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTables {
    /// One row per calendar day with readings, ascending.
    pub daily_totals: Vec<PeriodTotal>,
    /// One row per week (labelled by its closing Sunday) with readings, ascending.
    pub weekly_totals: Vec<PeriodTotal>,
    /// Statistics per building, keyed and ordered by building name.
    pub building_summary: BTreeMap<String, BuildingStats>,
}

impl AggregateTables {
    /// The building with the largest total; ties go to the first name.
    pub fn highest_consuming_building(&self) -> Option<(&str, &BuildingStats)> {
        let mut best: Option<(&str, &BuildingStats)> = None;
        for (name, stats) in &self.building_summary {
            match best {
                Some((_, b)) if stats.total <= b.total => {}
                _ => best = Some((name.as_str(), stats)),
            }
        }
        best
    }
}

// ── EnergyAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that buckets readings by time period and building.
pub struct EnergyAggregator;

impl EnergyAggregator {
    /// Compute all three tables for `dataset`.
    pub fn compute(dataset: &CanonicalDataset) -> AggregateTables {
        let records = dataset.records();
        AggregateTables {
            daily_totals: Self::daily_totals(records),
            weekly_totals: Self::weekly_totals(records),
            building_summary: Self::building_summary(records),
        }
    }

    /// Sum `records` per calendar day (midnight boundary, no zone conversion).
    pub fn daily_totals(records: &[ReadingRecord]) -> Vec<PeriodTotal> {
        Self::totals_by_period(records.iter(), |r| r.day())
    }

    /// Sum `records` per Monday–Sunday week, labelled by the Sunday.
    pub fn weekly_totals(records: &[ReadingRecord]) -> Vec<PeriodTotal> {
        Self::totals_by_period(records.iter(), Self::week_label)
    }

    /// Mean, min, max and total of `kwh` per building.
    pub fn building_summary(records: &[ReadingRecord]) -> BTreeMap<String, BuildingStats> {
        Self::group_by_building(records)
            .into_iter()
            .map(|(name, mut rows)| {
                let count = rows.len();
                let total = sum_kwh(&mut rows);
                let min = rows.iter().map(|r| r.kwh).fold(f64::INFINITY, f64::min);
                let max = rows.iter().map(|r| r.kwh).fold(f64::NEG_INFINITY, f64::max);
                let stats = BuildingStats {
                    mean: total / count as f64,
                    min,
                    max,
                    total,
                    count,
                };
                (name.to_string(), stats)
            })
            .collect()
    }

    /// Daily totals computed separately for each building.
    pub fn daily_totals_by_building(
        records: &[ReadingRecord],
    ) -> BTreeMap<String, Vec<PeriodTotal>> {
        Self::group_by_building(records)
            .into_iter()
            .map(|(name, rows)| {
                (
                    name.to_string(),
                    Self::totals_by_period(rows.into_iter(), |r| r.day()),
                )
            })
            .collect()
    }

    /// Mean of each building's weekly totals over the weeks it reported in.
    pub fn average_weekly_by_building(records: &[ReadingRecord]) -> BTreeMap<String, f64> {
        Self::group_by_building(records)
            .into_iter()
            .map(|(name, rows)| {
                let weeks = Self::totals_by_period(rows.into_iter(), Self::week_label);
                let mut week_sums: Vec<f64> = weeks.iter().map(|w| w.kwh).collect();
                week_sums.sort_by(|a, b| a.total_cmp(b));
                let avg = week_sums.iter().sum::<f64>() / week_sums.len() as f64;
                (name.to_string(), avg)
            })
            .collect()
    }

    /// Sum the stats from all periods; equals the dataset total.
    pub fn calculate_total(periods: &[PeriodTotal]) -> f64 {
        periods.iter().map(|p| p.kwh).sum()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Generic bucketing driver.
    ///
    /// `key_fn` maps a reading to the date that labels its bucket.
    fn totals_by_period<'a>(
        records: impl Iterator<Item = &'a ReadingRecord>,
        key_fn: impl Fn(&ReadingRecord) -> NaiveDate,
    ) -> Vec<PeriodTotal> {
        let mut buckets: BTreeMap<NaiveDate, Vec<&ReadingRecord>> = BTreeMap::new();
        for r in records {
            buckets.entry(key_fn(r)).or_default().push(r);
        }

        buckets
            .into_iter()
            .map(|(period, mut rows)| PeriodTotal {
                period,
                count: rows.len(),
                kwh: sum_kwh(&mut rows),
            })
            .collect()
    }

    /// Week-ending label of a reading. The loader rejects readings whose week
    /// would close past the calendar's end, so the clamp only affects
    /// hand-built records.
    fn week_label(r: &ReadingRecord) -> NaiveDate {
        week_ending(r.day()).unwrap_or(NaiveDate::MAX)
    }

    fn group_by_building(records: &[ReadingRecord]) -> BTreeMap<&str, Vec<&ReadingRecord>> {
        let mut groups: BTreeMap<&str, Vec<&ReadingRecord>> = BTreeMap::new();
        for r in records {
            groups.entry(r.building.as_str()).or_default().push(r);
        }
        groups
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
