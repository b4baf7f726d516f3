//! Ingestion, validation and aggregation of campus meter readings.
//!
//! Discovers per-building source files, validates and merges their rows into
//! the canonical dataset, computes daily, weekly and per-building aggregates,
//! and exposes the per-building index used for display.

pub mod aggregator;
pub mod analysis;
pub mod buildings;
pub mod merger;
pub mod reader;

pub use energy_core as core;
