//! Output artifacts for a campus energy run.
//!
//! Renders the cleaned dataset, the building summary table, the text report
//! and the dashboard, then writes them into the output directory. Every
//! artifact is rendered before the first byte hits the disk, and every temp
//! file is staged before any previous artifact is replaced.

pub mod dashboard;
pub mod writer;

use std::path::{Path, PathBuf};

use energy_core::error::Result;
use energy_data::analysis::AnalysisResult;
use tracing::info;

pub const CLEANED_DATA_FILE: &str = "cleaned_energy_data.csv";
pub const BUILDING_SUMMARY_FILE: &str = "building_summary.csv";
pub const SUMMARY_TEXT_FILE: &str = "summary.txt";
pub const DASHBOARD_FILE: &str = "dashboard.svg";

/// Where each artifact of a run was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub cleaned_data: PathBuf,
    pub building_summary: PathBuf,
    pub summary_text: PathBuf,
    pub dashboard: Option<PathBuf>,
}

impl ArtifactPaths {
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.cleaned_data, &self.building_summary, &self.summary_text]
            .into_iter()
            .chain(self.dashboard.as_ref())
    }
}

/// Render and write every artifact of `result` into `output_dir`.
///
/// With `with_dashboard == false` the image is skipped and the report says so.
pub fn write_artifacts(
    output_dir: &Path,
    result: &AnalysisResult,
    with_dashboard: bool,
) -> Result<ArtifactPaths> {
    let cleaned = writer::render_cleaned_dataset(&result.dataset)?;
    let summary_csv = writer::render_building_summary(&result.tables.building_summary)?;
    let dashboard = with_dashboard.then(|| dashboard::render_dashboard(&result.dataset));
    let text = writer::render_summary_text(
        &result.dataset,
        &result.tables,
        dashboard.as_ref().map(|_| DASHBOARD_FILE),
    );

    std::fs::create_dir_all(output_dir)?;

    let paths = ArtifactPaths {
        cleaned_data: output_dir.join(CLEANED_DATA_FILE),
        building_summary: output_dir.join(BUILDING_SUMMARY_FILE),
        summary_text: output_dir.join(SUMMARY_TEXT_FILE),
        dashboard: dashboard.as_ref().map(|_| output_dir.join(DASHBOARD_FILE)),
    };

    let mut files: Vec<(&Path, &[u8])> = vec![
        (paths.cleaned_data.as_path(), cleaned.as_slice()),
        (paths.building_summary.as_path(), summary_csv.as_slice()),
        (paths.summary_text.as_path(), text.as_bytes()),
    ];
    if let (Some(path), Some(svg)) = (&paths.dashboard, &dashboard) {
        files.push((path.as_path(), svg.as_bytes()));
    }

    let staged = stage_all(&files)?;
    for (tmp, path) in &staged {
        std::fs::rename(tmp, path)?;
    }

    for path in paths.iter() {
        info!("Saved {}", path.display());
    }
    Ok(paths)
}

/// Write each file to a temp sibling. On failure the temps already written
/// are removed and no target is touched.
fn stage_all(files: &[(&Path, &[u8])]) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let tmp = path.with_extension("tmp");
        if let Err(e) = std::fs::write(&tmp, contents) {
            for (written, _) in &staged {
                let _ = std::fs::remove_file(written);
            }
            return Err(e.into());
        }
        staged.push((tmp, path.to_path_buf()));
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_data::analysis::analyze_directory;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_source(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn sample_result(dir: &Path) -> AnalysisResult {
        write_source(
            dir,
            "A.csv",
            &["timestamp,kwh", "2024-01-01T00:00,10", "2024-01-02T00:00,5"],
        );
        write_source(dir, "B.csv", &["timestamp,kwh", "2024-01-01T00:00,7"]);
        analyze_directory(dir, "csv").unwrap()
    }

    #[test]
    fn test_write_artifacts_writes_all_four() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = sample_result(data.path());

        let paths = write_artifacts(&out.path().join("output"), &result, true).unwrap();

        assert_eq!(paths.iter().count(), 4);
        for path in paths.iter() {
            assert!(path.is_file(), "{} must exist", path.display());
        }
        let text = std::fs::read_to_string(&paths.summary_text).unwrap();
        assert!(text.contains("Total Campus Consumption: 22.00 kWh"));
        assert!(text.contains("Highest Consuming Building: A"));

        let leftovers: Vec<_> = std::fs::read_dir(out.path().join("output"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "tmp").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_artifacts_without_dashboard() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = sample_result(data.path());

        let paths = write_artifacts(out.path(), &result, false).unwrap();

        assert!(paths.dashboard.is_none());
        assert!(!out.path().join(DASHBOARD_FILE).exists());
        assert_eq!(paths.iter().count(), 3);
    }

    #[test]
    fn test_failed_staging_keeps_previous_artifacts() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = sample_result(data.path());

        std::fs::write(out.path().join(CLEANED_DATA_FILE), "previous run\n").unwrap();
        // A directory squatting on the summary temp path makes staging fail.
        std::fs::create_dir(out.path().join("summary.tmp")).unwrap();

        assert!(write_artifacts(out.path(), &result, true).is_err());

        assert_eq!(
            std::fs::read_to_string(out.path().join(CLEANED_DATA_FILE)).unwrap(),
            "previous run\n"
        );
        assert!(!out.path().join(BUILDING_SUMMARY_FILE).exists());
        assert!(!out.path().join("cleaned_energy_data.tmp").exists());
        assert!(!out.path().join("building_summary.tmp").exists());
    }

    #[test]
    fn test_artifacts_are_byte_identical_across_runs() {
        let data = TempDir::new().unwrap();
        let out1 = TempDir::new().unwrap();
        let out2 = TempDir::new().unwrap();
        let first = sample_result(data.path());
        let second = analyze_directory(data.path(), "csv").unwrap();

        let p1 = write_artifacts(out1.path(), &first, true).unwrap();
        let p2 = write_artifacts(out2.path(), &second, true).unwrap();

        for (a, b) in p1.iter().zip(p2.iter()) {
            assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
        }
    }
}
