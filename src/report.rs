//! Batch report persistence
//!
//! Writes the outcome of a run to a JSON file next to (or away from) the
//! exported meshes so partial successes can be inspected afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use segmesh_batch::BatchReport;
use serde::Serialize;
use tracing::info;

/// Top-level report file structure
#[derive(Debug, Serialize)]
pub struct ReportFile<'a> {
    /// Report format version
    pub version: u32,
    /// Human-readable local timestamp
    pub timestamp: String,
    /// Where the artifacts were written
    pub output_dir: PathBuf,
    #[serde(flatten)]
    pub report: &'a BatchReport,
}

impl<'a> ReportFile<'a> {
    pub fn new(output_dir: &Path, report: &'a BatchReport) -> Self {
        Self {
            version: 1,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            output_dir: output_dir.to_path_buf(),
            report,
        }
    }
}

/// Serialize `report` as pretty JSON to `path`, creating parent directories.
pub fn write_report(path: &Path, output_dir: &Path, report: &BatchReport) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).context("Failed to create report directory")?;
    }
    let json = serde_json::to_string_pretty(&ReportFile::new(output_dir, report))
        .context("Failed to serialize batch report")?;
    fs::write(path, json).context("Failed to write report file")?;
    info!("Saved batch report to {:?}", path);
    Ok(())
}

/// Format elapsed time as "Xm Ys" or "Y.ZZZs"
pub fn format_elapsed(millis: u64) -> String {
    let total_secs = millis / 1000;
    let minutes = total_secs / 60;
    let secs = total_secs % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}.{:03}s", secs, millis % 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmesh_assets::InMemorySource;
    use segmesh_batch::{BatchConfig, BatchOrchestrator};
    use segmesh_core::SegmentId;

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("meshes");
        let report = BatchOrchestrator::new(BatchConfig::new(&out))
            .with_source(InMemorySource::new())
            .run(&[SegmentId(5)])
            .unwrap();

        let path = dir.path().join("reports").join("run.json");
        write_report(&path, &out, &report).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["processed"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["segments"][0]["id"], 5);
        assert_eq!(json["segments"][0]["kind"], "fetch");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0.000s");
        assert_eq!(format_elapsed(1234), "1.234s");
        assert_eq!(format_elapsed(65_000), "1m 5s");
    }
}
