use clap::Parser;
use std::path::PathBuf;

use crate::error::{EnergyError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Ingest per-building meter files and build the campus energy report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "campus-energy",
    about = "Ingest per-building meter files and build the campus energy report",
    version
)]
pub struct Settings {
    /// Directory holding one source file per building
    #[arg(long, env = "CAMPUS_ENERGY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory the artifacts are written into
    #[arg(long, env = "CAMPUS_ENERGY_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Extension of the source files to pick up
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Skip rendering the dashboard image
    #[arg(long)]
    pub no_dashboard: bool,
}

impl Settings {
    /// Parse the process arguments and validate them.
    ///
    /// `--help`, `--version` and malformed arguments exit the process the
    /// way clap normally does.
    pub fn load() -> Result<Self> {
        Settings::parse().resolve()
    }

    /// Same as [`Settings::load`] but over an explicit argument list.
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings =
            Settings::try_parse_from(args).map_err(|e| EnergyError::Config(e.to_string()))?;
        settings.resolve()
    }

    /// Normalise the extension and apply the `--debug` flag.
    fn resolve(mut self) -> Result<Self> {
        self.extension = self.extension.trim_start_matches('.').to_ascii_lowercase();
        if self.extension.is_empty() {
            return Err(EnergyError::Config(
                "extension must not be empty".to_string(),
            ));
        }

        if self.debug {
            self.log_level = "DEBUG".to_string();
        }

        Ok(self)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
