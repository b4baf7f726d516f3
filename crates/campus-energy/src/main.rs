mod bootstrap;

use anyhow::{Context, Result};
use energy_core::settings::Settings;
use energy_data::analysis::analyze_directory;
use energy_data::buildings::BuildingIndex;
use energy_report::write_artifacts;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Campus Energy Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, Output: {}, Extension: .{}",
        settings.data_dir.display(),
        settings.output_dir.display(),
        settings.extension
    );

    // Fatal when no reading survives; nothing is written in that case.
    let analysis = analyze_directory(&settings.data_dir, &settings.extension)
        .with_context(|| format!("ingesting {}", settings.data_dir.display()))?;

    tracing::info!(
        "Analysis finished: load {:.3}s, aggregate {:.3}s",
        analysis.metadata.load_time_seconds,
        analysis.metadata.aggregate_time_seconds
    );

    let index = BuildingIndex::from_dataset(&analysis.dataset);
    for building in index.buildings() {
        tracing::info!("{}", building.report());
    }

    let paths = write_artifacts(&settings.output_dir, &analysis, !settings.no_dashboard)
        .with_context(|| format!("writing artifacts to {}", settings.output_dir.display()))?;

    for path in paths.iter() {
        println!("{}", path.display());
    }
    tracing::info!(
        "Run complete: {} ({} files failed)",
        analysis.ingest,
        analysis.ingest.files_failed()
    );

    Ok(())
}
