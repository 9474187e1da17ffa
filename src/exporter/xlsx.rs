use crate::error::{ConvertError, Result};
use crate::exporter::{ExportFormat, Exporter};
use crate::extractor::RecordSet;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook};
use std::io::Write;
use tracing::warn;

/// Excel's row limit per worksheet, header row included.
const MAX_ROWS: usize = 1_048_576;

/// Excel's limit on characters in one cell.
const MAX_CELL_CHARS: usize = 32_767;

pub struct XlsxExporter {
    sheet_name: String,
}

impl XlsxExporter {
    pub fn new<S: Into<String>>(sheet_name: S) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn build_workbook(&self, records: &RecordSet) -> Result<Workbook> {
        if records.len() + 1 > MAX_ROWS {
            return Err(ConvertError::Export {
                message: format!(
                    "{} records exceed the worksheet limit of {} rows",
                    records.len(),
                    MAX_ROWS - 1
                ),
            });
        }

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(self.sheet_name.as_str())?;

        for (col, name) in records.field_names().iter().enumerate() {
            worksheet.write_string_with_format(0, col as ColNum, *name, &header)?;
        }

        for (row, record) in records.iter().enumerate() {
            let row = (row + 1) as RowNum;
            for (col, value) in record.values().enumerate() {
                // strings only: numeric-looking ids keep their leading zeros
                worksheet.write_string(row, col as ColNum, fit_cell(value, row))?;
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();

        Ok(workbook)
    }
}

fn fit_cell(value: &str, row: RowNum) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            warn!(
                row,
                chars = value.chars().count(),
                "value exceeds the Excel cell limit, truncating"
            );
            &value[..end]
        }
        None => value,
    }
}

impl Exporter for XlsxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn write_to(&self, records: &RecordSet, writer: &mut dyn Write) -> Result<()> {
        let mut workbook = self.build_workbook(records)?;
        let buffer = workbook.save_to_buffer()?;
        writer.write_all(&buffer)?;
        Ok(())
    }
}
