use crate::error::Result;
use crate::exporter::{ExportFormat, Exporter};
use crate::extractor::RecordSet;
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;

pub struct CsvExporter {
    delimiter: u8,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write_to(&self, records: &RecordSet, writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(writer);

        csv_writer.write_record(records.field_names())?;
        for record in records {
            csv_writer.write_record(record.values())?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::test_support::sample_records;

    fn render(exporter: &CsvExporter) -> String {
        String::from_utf8(exporter.to_bytes(&sample_records()).unwrap()).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let output = render(&CsvExporter::new());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Date,PartnerId,Quantity,UserName,Department,Purpose,Value"
        );
        assert_eq!(lines[1], "2024-01-05,P-00042,007,Smith Jane,Finance,c68,0125.50");
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        let output = render(&CsvExporter::new());
        assert!(output.contains("2024-01-06,,,O'Neil Pat,\"Sales, East\",,"));
    }

    #[test]
    fn test_custom_delimiter() {
        let output = render(&CsvExporter::new().with_delimiter(b';'));
        assert!(output.starts_with("Date;PartnerId;Quantity"));
        assert!(output.contains(";Sales, East;"));
    }
}
