use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single meter observation for one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// Timezone-naive wall-clock time of the reading.
    pub timestamp: NaiveDateTime,
    /// Consumption in kilowatt-hours; never negative.
    pub kwh: f64,
    /// Logical name of the source the reading came from.
    pub building: String,
}

impl ReadingRecord {
    pub fn new(timestamp: NaiveDateTime, kwh: f64, building: impl Into<String>) -> Self {
        Self {
            timestamp,
            kwh,
            building: building.into(),
        }
    }

    /// Calendar day the reading falls on (local midnight boundary).
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Summed consumption for one time bucket (a day or a week).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    /// The calendar day, or the Sunday that ends the week.
    pub period: NaiveDate,
    pub kwh: f64,
    /// Number of readings summed into the bucket.
    pub count: usize,
}

/// Summary statistics over every reading of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub count: usize,
}

/// Total ordering used before any floating-point summation.
///
/// Readings are ordered by timestamp, then building, then value, so a bucket
/// sums to the same bits whatever order the source files were discovered in.
pub fn canonical_cmp(a: &ReadingRecord, b: &ReadingRecord) -> std::cmp::Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.building.cmp(&b.building))
        .then_with(|| a.kwh.total_cmp(&b.kwh))
}

/// Sum the `kwh` of `readings` in canonical order.
pub fn sum_kwh(readings: &mut [&ReadingRecord]) -> f64 {
    readings.sort_by(|a, b| canonical_cmp(a, b));
    readings.iter().map(|r| r.kwh).sum()
}
