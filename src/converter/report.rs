use crate::converter::batch::BatchOutcome;
use crate::converter::document::DocumentResult;
use crate::error::Result;
use crate::exporter::ExportFormat;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const REPORT_FILE_NAME: &str = "conversion_report.json";

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub format: ExportFormat,
    pub documents: Vec<DocumentResult>,
    pub failures: Vec<FailedDocument>,
    pub total_rows: usize,
    pub total_bytes_read: u64,
    pub total_bytes_written: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub input: PathBuf,
    pub error: String,
}

impl ConversionReport {
    pub fn from_outcome(
        outcome: &BatchOutcome,
        format: ExportFormat,
        started_at: DateTime<Utc>,
    ) -> Self {
        let documents = outcome.documents.clone();
        let failures = outcome
            .failures
            .iter()
            .map(|(report, error)| FailedDocument {
                input: report.source_path.clone(),
                error: error.to_string(),
            })
            .collect();

        Self {
            started_at,
            duration: outcome.progress.elapsed(),
            format,
            total_rows: documents.iter().map(|d| d.rows_processed).sum(),
            total_bytes_read: documents.iter().map(|d| d.bytes_read).sum(),
            total_bytes_written: documents.iter().map(|d| d.bytes_written).sum(),
            documents,
            failures,
        }
    }

    pub fn files_converted(&self) -> usize {
        self.documents.len()
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && !self.documents.is_empty()
    }

    /// Write the report as pretty JSON into `dir`, returning its path.
    pub fn save_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE_NAME);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::batch::ConversionProgress;
    use crate::error::ConvertError;
    use crate::scanner::ReportFile;
    use tempfile::TempDir;

    fn document(rows: usize) -> DocumentResult {
        DocumentResult {
            input: PathBuf::from("a.txt"),
            output: PathBuf::from("a_converted.xlsx"),
            rows_processed: rows,
            lines_scanned: rows + 2,
            skipped_lines: 0,
            blank_records: 0,
            bytes_read: 100,
            bytes_written: 2000,
            duration: Duration::from_millis(5),
        }
    }

    fn outcome() -> BatchOutcome {
        BatchOutcome {
            documents: vec![document(3), document(4)],
            failures: vec![(
                ReportFile::new(PathBuf::from("b.txt"), PathBuf::from("b.txt"), 10),
                ConvertError::NoValidData {
                    source_name: "b.txt".to_string(),
                    lines_scanned: 2,
                },
            )],
            progress: ConversionProgress::new(3, 210),
        }
    }

    #[test]
    fn test_report_totals() {
        let report = ConversionReport::from_outcome(&outcome(), ExportFormat::Xlsx, Utc::now());

        assert_eq!(report.total_rows, 7);
        assert_eq!(report.total_bytes_read, 200);
        assert_eq!(report.total_bytes_written, 4000);
        assert_eq!(report.files_converted(), 2);
        assert_eq!(report.files_failed(), 1);
        assert!(!report.is_complete_success());
        assert_eq!(report.failures[0].input, PathBuf::from("b.txt"));
    }

    #[test]
    fn test_save_report() {
        let temp_dir = TempDir::new().unwrap();
        let report = ConversionReport::from_outcome(&outcome(), ExportFormat::Csv, Utc::now());

        let path = report.save_to_dir(temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join(REPORT_FILE_NAME));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["format"], "csv");
        assert_eq!(json["total_rows"], 7);
        assert_eq!(json["documents"].as_array().unwrap().len(), 2);
    }
}
