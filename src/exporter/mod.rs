pub mod delimited;
pub mod json;
pub mod xlsx;

pub use delimited::CsvExporter;
pub use json::JsonExporter;
pub use xlsx::XlsxExporter;

use crate::error::{ConvertError, Result};
use crate::extractor::RecordSet;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Excel workbook with a single sheet
    Xlsx,
    /// Comma-separated values
    Csv,
    /// Array of JSON objects
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writes a [`RecordSet`] as a table: one header row with the field names in
/// declaration order, then one row per record. Values are always written as
/// text.
pub trait Exporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn extension(&self) -> &'static str {
        self.format().extension()
    }

    fn write_to(&self, records: &RecordSet, writer: &mut dyn Write) -> Result<()>;

    fn to_bytes(&self, records: &RecordSet) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(records, &mut buffer)?;
        Ok(buffer)
    }

    /// Write to `path` through a temporary file in the same directory, so a
    /// failed export never leaves a truncated file behind. Returns the number
    /// of bytes written.
    fn export_to_path(&self, records: &RecordSet, path: &Path, overwrite: bool) -> Result<u64> {
        if path.exists() && !overwrite {
            return Err(ConvertError::OutputExists {
                path: path.display().to_string(),
            });
        }

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            self.write_to(records, &mut writer)?;
            writer.flush()?;
        }

        let file = temp_file.persist(path).map_err(|e| ConvertError::Io(e.error))?;
        Ok(file.metadata()?.len())
    }
}

pub fn exporter_for(format: ExportFormat, sheet_name: &str) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Xlsx => Box::new(XlsxExporter::new(sheet_name)),
        ExportFormat::Csv => Box::new(CsvExporter::new()),
        ExportFormat::Json => Box::new(JsonExporter::new()),
    }
}

/// `reports/march.txt` becomes `<dir>/march_converted.xlsx`.
pub fn output_path_for(
    input: &Path,
    output_dir: Option<&Path>,
    suffix: &str,
    format: ExportFormat,
) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("report");
    let file_name = format!("{}{}.{}", stem, suffix, format.extension());

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input
            .parent()
            .map(|p| p.join(&file_name))
            .unwrap_or_else(|| PathBuf::from(&file_name)),
    }
}
