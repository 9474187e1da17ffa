use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::exporter::{exporter_for, output_path_for, ExportFormat, Exporter};
use crate::extractor::{FieldMap, RecordExtractor, RecordSet};
use crate::scanner::ReportFile;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of converting one report file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_processed: usize,
    pub lines_scanned: usize,
    pub skipped_lines: usize,
    pub blank_records: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub duration: Duration,
}

/// Converts report files one at a time: read, extract, export.
pub struct DocumentConverter {
    extractor: RecordExtractor,
    exporter: Box<dyn Exporter>,
    output_dir: Option<PathBuf>,
    file_suffix: String,
    overwrite: bool,
}

impl DocumentConverter {
    pub fn new(field_map: FieldMap, exporter: Box<dyn Exporter>) -> Self {
        Self {
            extractor: RecordExtractor::new(field_map),
            exporter,
            output_dir: None,
            file_suffix: "_converted".to_string(),
            overwrite: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let exporter = exporter_for(config.output.format, &config.output.sheet_name);

        Self::new(FieldMap::concur(), exporter)
            .with_lossy_utf8(config.input.lossy_utf8)
            .with_output_dir(config.output.base_directory.clone())
            .with_file_suffix(config.output.file_suffix.clone())
    }

    pub fn with_lossy_utf8(mut self, lossy: bool) -> Self {
        self.extractor = self.extractor.with_lossy_utf8(lossy);
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_file_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.exporter.format()
    }

    pub fn output_path(&self, report: &ReportFile) -> PathBuf {
        let output_dir = self.output_dir.as_ref().map(|dir| match report.relative_path.parent() {
            Some(parent) => dir.join(parent),
            None => dir.clone(),
        });

        output_path_for(
            &report.source_path,
            output_dir.as_deref(),
            &self.file_suffix,
            self.exporter.format(),
        )
    }

    /// Extract records from raw report bytes. An input without a single
    /// DETAIL record is reported as [`ConvertError::NoValidData`].
    pub fn extract(&self, bytes: &[u8], source_name: &str) -> Result<RecordSet> {
        let records = self.extractor.extract_bytes(bytes);

        for skipped in records.skipped() {
            warn!(
                source = source_name,
                line = skipped.line_number,
                reason = %skipped.reason,
                "skipped DETAIL line"
            );
        }

        records.require_records(source_name)
    }

    pub fn convert_bytes(&self, bytes: &[u8], source_name: &str) -> Result<Vec<u8>> {
        let records = self.extract(bytes, source_name)?;
        self.exporter.to_bytes(&records)
    }

    pub fn convert_file(&self, report: &ReportFile) -> Result<DocumentResult> {
        let start = Instant::now();
        let bytes = fs::read(&report.source_path)?;
        let records = self.extract(&bytes, &report.display_path())?;

        let output = self.output_path(report);
        if is_same_file(&report.source_path, &output) {
            return Err(ConvertError::InvalidInput {
                path: report.source_path.display().to_string(),
                reason: "output would overwrite the input file".to_string(),
            });
        }

        let bytes_written = self
            .exporter
            .export_to_path(&records, &output, self.overwrite)?;

        info!(
            input = %report.display_path(),
            output = %output.display(),
            rows = records.len(),
            "converted report"
        );

        Ok(DocumentResult {
            input: report.source_path.clone(),
            output,
            rows_processed: records.len(),
            lines_scanned: records.lines_scanned(),
            skipped_lines: records.skipped().len(),
            blank_records: records.blank_records(),
            bytes_read: bytes.len() as u64,
            bytes_written,
            duration: start.elapsed(),
        })
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
