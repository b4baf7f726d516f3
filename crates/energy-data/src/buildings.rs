//! Per-building view of the canonical dataset, used for display.

use std::collections::BTreeMap;

use energy_core::formatting::format_kwh;
use energy_core::models::{sum_kwh, ReadingRecord};

use crate::merger::CanonicalDataset;

/// One building and the readings appended to it.
#[derive(Debug, Clone)]
pub struct Building {
    name: String,
    readings: Vec<ReadingRecord>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn readings(&self) -> &[ReadingRecord] {
        &self.readings
    }

    pub fn add_reading(&mut self, reading: ReadingRecord) {
        self.readings.push(reading);
    }

    /// Sum of all appended readings, recomputed on every call.
    pub fn total_consumption(&self) -> f64 {
        let mut rows: Vec<&ReadingRecord> = self.readings.iter().collect();
        sum_kwh(&mut rows)
    }

    /// `"<name>: Total Consumption = <total> kWh"`.
    pub fn report(&self) -> String {
        format!(
            "{}: Total Consumption = {} kWh",
            self.name,
            format_kwh(self.total_consumption())
        )
    }
}

/// Buildings keyed by name; entries are created on first reading.
#[derive(Debug, Clone, Default)]
pub struct BuildingIndex {
    buildings: BTreeMap<String, Building>,
}

impl BuildingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every reading of `dataset` under its building.
    pub fn from_dataset(dataset: &CanonicalDataset) -> Self {
        let mut index = Self::new();
        for r in dataset.records() {
            index.add_reading(&r.building, r.clone());
        }
        index
    }

    /// Append `reading` to `building_name`, creating the entry if needed.
    ///
    /// Repeated identical readings are all kept.
    pub fn add_reading(&mut self, building_name: &str, reading: ReadingRecord) {
        self.buildings
            .entry(building_name.to_string())
            .or_insert_with(|| Building::new(building_name))
            .add_reading(reading);
    }

    pub fn get(&self, name: &str) -> Option<&Building> {
        self.buildings.get(name)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn total_consumption(&self, name: &str) -> Option<f64> {
        self.get(name).map(Building::total_consumption)
    }

    pub fn report(&self, name: &str) -> Option<String> {
        self.get(name).map(Building::report)
    }
}
