//! Core types shared by the campus energy crates.
//!
//! Holds the canonical reading model, aggregate value types, the error
//! taxonomy, timestamp normalisation, numeric formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{EnergyError, FileError, Result, RowError};
pub use models::{BuildingStats, PeriodTotal, ReadingRecord};
