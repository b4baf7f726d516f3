//! Source file discovery and parsing.
//!
//! Each source file holds the readings of one building. The building name is
//! passed into the parser explicitly; [`load_sources`] derives it from the
//! file stem. A file that cannot be parsed at all is recorded as a
//! [`FileError`] and skipped; a row that fails validation is dropped and
//! counted.

use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use energy_core::error::{EnergyError, FileError, Result, RowError};
use energy_core::models::ReadingRecord;
use energy_core::time_utils::{parse_timestamp, week_ending};
use tracing::{debug, info, warn};

/// Required header names, matched case-insensitively.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const KWH_COLUMN: &str = "kwh";

// ── Public types ──────────────────────────────────────────────────────────────

/// The validated readings of one source file.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub building: String,
    pub path: PathBuf,
    pub records: Vec<ReadingRecord>,
    /// Data rows seen in the file, valid or not.
    pub rows_read: usize,
    /// Data rows dropped by validation.
    pub rows_rejected: usize,
}

/// Everything one ingestion pass over a directory produced.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub data_dir: PathBuf,
    pub files_attempted: usize,
    /// Successfully parsed files, in discovery order.
    pub batches: Vec<SourceBatch>,
    /// One entry per skipped file.
    pub errors: Vec<FileError>,
}

impl LoadOutcome {
    /// Total readings that survived validation across all files.
    pub fn rows_kept(&self) -> usize {
        self.batches.iter().map(|b| b.records.len()).sum()
    }

    /// Total rows dropped by validation across all files.
    pub fn rows_rejected(&self) -> usize {
        self.batches.iter().map(|b| b.rows_rejected).sum()
    }
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    timestamp: usize,
    kwh: usize,
    width: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the source files directly inside `data_dir` whose extension matches
/// `extension` (case-insensitive), sorted by path.
pub fn find_source_files(data_dir: &Path, extension: &str) -> Vec<PathBuf> {
    if !data_dir.exists() {
        warn!("Data path does not exist: {}", data_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// The building identifier for a source path: its extension-stripped name.
pub fn building_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load every matching source file under `data_dir`.
///
/// Never fails: unreadable or malformed files end up in
/// [`LoadOutcome::errors`]. An empty outcome is reported by the merger.
pub fn load_sources(data_dir: &Path, extension: &str) -> LoadOutcome {
    let files = find_source_files(data_dir, extension);
    if files.is_empty() {
        warn!(
            "No .{} files found in {}",
            extension,
            data_dir.display()
        );
    }

    let mut outcome = LoadOutcome {
        data_dir: data_dir.to_path_buf(),
        files_attempted: files.len(),
        ..LoadOutcome::default()
    };

    for path in &files {
        match load_file(path) {
            Ok(batch) => outcome.batches.push(batch),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                outcome.errors.push(FileError::new(path, &e));
            }
        }
    }

    info!(
        "Loaded {} of {} files ({} readings kept, {} rows rejected)",
        outcome.batches.len(),
        outcome.files_attempted,
        outcome.rows_kept(),
        outcome.rows_rejected(),
    );

    outcome
}

/// Open and parse one source file, tagging its rows with the file stem.
pub fn load_file(path: &Path) -> Result<SourceBatch> {
    let file = std::fs::File::open(path).map_err(|source| EnergyError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(file, &building_name(path), path)
}

/// Parse tabular source data for `building`.
///
/// `origin` is only used in diagnostics, so this works on any reader.
/// Fails when the stream is not readable as delimited text or its header
/// lacks a required column; individual bad rows are dropped.
pub fn parse_source<R: Read>(reader: R, building: &str, origin: &Path) -> Result<SourceBatch> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = resolve_columns(rdr.headers()?, origin)?;

    let mut batch = SourceBatch {
        building: building.to_string(),
        path: origin.to_path_buf(),
        records: Vec::new(),
        rows_read: 0,
        rows_rejected: 0,
    };

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                batch.rows_read += 1;
                batch.rows_rejected += 1;
                debug!("Unreadable row in {}: {}", origin.display(), e);
                continue;
            }
        };

        batch.rows_read += 1;
        match validate_row(&record, columns, building) {
            Ok(reading) => batch.records.push(reading),
            Err(e) => {
                batch.rows_rejected += 1;
                debug!(
                    "Rejected row {} in {}: {}",
                    batch.rows_read,
                    origin.display(),
                    e
                );
            }
        }
    }

    debug!(
        "File {}: {} read, {} kept, {} rejected",
        origin.display(),
        batch.rows_read,
        batch.records.len(),
        batch.rows_rejected,
    );

    Ok(batch)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn resolve_columns(headers: &StringRecord, origin: &Path) -> Result<Columns> {
    let find = |name: &'static str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| EnergyError::MissingColumn {
                path: origin.to_path_buf(),
                column: name,
            })
    };

    Ok(Columns {
        timestamp: find(TIMESTAMP_COLUMN)?,
        kwh: find(KWH_COLUMN)?,
        width: headers.len(),
    })
}

/// Validate one data row against the resolved header.
fn validate_row(
    record: &StringRecord,
    columns: Columns,
    building: &str,
) -> std::result::Result<ReadingRecord, RowError> {
    if record.len() != columns.width {
        return Err(RowError::FieldCount {
            expected: columns.width,
            found: record.len(),
        });
    }

    let ts_str = record.get(columns.timestamp).unwrap_or("");
    let timestamp = parse_timestamp(ts_str)
        .filter(|ts| week_ending(ts.date()).is_some())
        .ok_or_else(|| RowError::InvalidTimestamp(ts_str.to_string()))?;

    let kwh_str = record.get(columns.kwh).unwrap_or("");
    let kwh: f64 = kwh_str
        .parse()
        .map_err(|_| RowError::InvalidKwh(kwh_str.to_string()))?;
    if !kwh.is_finite() {
        return Err(RowError::InvalidKwh(kwh_str.to_string()));
    }
    if kwh < 0.0 {
        return Err(RowError::NegativeKwh(kwh));
    }

    Ok(ReadingRecord::new(timestamp, kwh, building))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_source(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn parse(text: &str) -> Result<SourceBatch> {
        parse_source(text.as_bytes(), "Library", Path::new("Library.csv"))
    }

    // ── find_source_files ─────────────────────────────────────────────────────

    #[test]
    fn test_find_source_files_filters_extension() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "a.csv", &["timestamp,kwh"]);
        write_source(dir.path(), "b.CSV", &["timestamp,kwh"]);
        write_source(dir.path(), "notes.txt", &["hello"]);

        let files = find_source_files(dir.path(), "csv");
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_find_source_files_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("archive");
        std::fs::create_dir_all(&sub).unwrap();
        write_source(dir.path(), "root.csv", &["timestamp,kwh"]);
        write_source(&sub, "old.csv", &["timestamp,kwh"]);

        let files = find_source_files(dir.path(), "csv");
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("root.csv"));
    }

    #[test]
    fn test_find_source_files_nonexistent_path() {
        let files = find_source_files(Path::new("/tmp/does-not-exist-energy-test-xyz"), "csv");
        assert!(files.is_empty());
    }

    #[test]
    fn test_find_source_files_sorted() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "c.csv", &["x"]);
        write_source(dir.path(), "a.csv", &["x"]);
        write_source(dir.path(), "b.csv", &["x"]);

        let files = find_source_files(dir.path(), "csv");
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
    }

    // ── building_name ─────────────────────────────────────────────────────────

    #[test]
    fn test_building_name_strips_extension() {
        assert_eq!(building_name(Path::new("/data/Science Hall.csv")), "Science Hall");
    }

    // ── parse_source ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_source_tags_building() {
        let batch = parse("timestamp,kwh\n2024-01-01T00:00,10\n2024-01-02T00:00,5\n").unwrap();
        assert_eq!(batch.records.len(), 2);
        assert!(batch.records.iter().all(|r| r.building == "Library"));
        assert_eq!(batch.records[0].kwh, 10.0);
        assert_eq!(batch.rows_rejected, 0);
    }

    #[test]
    fn test_parse_source_column_order_and_case() {
        let batch = parse("site,KWH,Timestamp\nx,2.5,2024-01-01 06:00:00\n").unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].kwh, 2.5);
    }

    #[test]
    fn test_parse_source_skips_bad_rows() {
        let text = "timestamp,kwh\n\
                    2024-01-01T00:00,10\n\
                    2024-01-01T01:00,10,extra\n\
                    2024-01-01T02:00\n\
                    yesterday,4\n\
                    2024-01-01T03:00,abc\n\
                    2024-01-01T04:00,-1\n\
                    2024-01-01T05:00,NaN\n\
                    2024-01-01T06:00,3\n";
        let batch = parse(text).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rows_read, 8);
        assert_eq!(batch.rows_rejected, 6);
    }

    #[test]
    fn test_parse_source_header_only_is_empty_batch() {
        let batch = parse("timestamp,kwh\n").unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.rows_read, 0);
    }

    #[test]
    fn test_parse_source_missing_column_is_file_error() {
        let err = parse("time,kwh\n2024-01-01,1\n").unwrap_err();
        assert!(matches!(
            err,
            EnergyError::MissingColumn {
                column: "timestamp",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_source_empty_input_is_file_error() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_source_binary_is_file_error() {
        let bytes: &[u8] = &[0x89, b'P', b'N', b'G', 0xff, 0xfe, b'\n', 0x00, 0x01];
        let err = parse_source(bytes, "Gym", Path::new("Gym.csv")).unwrap_err();
        assert!(matches!(err, EnergyError::Csv(_)));
    }

    // ── validate_row ──────────────────────────────────────────────────────────

    #[test]
    fn test_validate_row_reports_reason() {
        let columns = Columns {
            timestamp: 0,
            kwh: 1,
            width: 2,
        };
        let negative = StringRecord::from(vec!["2024-01-01", "-2"]);
        assert_eq!(
            validate_row(&negative, columns, "A"),
            Err(RowError::NegativeKwh(-2.0))
        );

        let short = StringRecord::from(vec!["2024-01-01"]);
        assert_eq!(
            validate_row(&short, columns, "A"),
            Err(RowError::FieldCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_validate_row_rejects_week_past_calendar_end() {
        let columns = Columns {
            timestamp: 0,
            kwh: 1,
            width: 2,
        };
        let row = StringRecord::from(vec!["+262142-12-31 12:00:00", "2"]);
        assert_eq!(
            validate_row(&row, columns, "A"),
            Err(RowError::InvalidTimestamp(
                "+262142-12-31 12:00:00".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_source_rejects_timestamp_at_calendar_end() {
        let text = "timestamp,kwh
                    2024-01-01T00:00,1
                    +262142-12-31 12:00:00,2
";
        let batch = parse(text).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.rows_read, 2);
        assert_eq!(batch.rows_rejected, 1);
    }

    // ── load_sources ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_sources_skips_unparseable_file() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "Library.csv",
            &["timestamp,kwh", "2024-01-01T00:00,10", "2024-01-02T00:00,5"],
        );
        write_source(dir.path(), "Broken.csv", &["this file has no header we know"]);

        let outcome = load_sources(dir.path(), "csv");

        assert_eq!(outcome.files_attempted, 2);
        assert_eq!(outcome.batches.len(), 1);
        assert_eq!(outcome.batches[0].building, "Library");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].path.ends_with("Broken.csv"));
        assert_eq!(outcome.rows_kept(), 2);
    }

    #[test]
    fn test_load_sources_empty_directory() {
        let dir = TempDir::new().unwrap();
        let outcome = load_sources(dir.path(), "csv");
        assert_eq!(outcome.files_attempted, 0);
        assert!(outcome.batches.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
